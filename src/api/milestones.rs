//! Milestone panel endpoints.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, resource_types, CreateMilestoneRequest, Milestone, MilestoneProgress,
    MilestoneStatus, UpdateMilestoneRequest, User,
};
use crate::AppState;

use super::audit::{audit_log, extract_client_ip};
use super::error::{ApiError, ValidationErrorBuilder};
use super::startups::load_startup;
use super::validation::{validate_date, validate_name, validate_text, validate_uuid};

#[derive(Debug, Serialize)]
pub struct MilestoneListResponse {
    pub items: Vec<Milestone>,
    pub progress: MilestoneProgress,
}

pub(super) async fn list_for_startup(
    pool: &sqlx::SqlitePool,
    startup_id: &str,
) -> Result<Vec<Milestone>, sqlx::Error> {
    sqlx::query_as::<_, Milestone>(
        "SELECT * FROM milestones WHERE startup_id = ? ORDER BY due_date IS NULL, due_date ASC, created_at ASC",
    )
    .bind(startup_id)
    .fetch_all(pool)
    .await
}

pub(super) fn progress(items: &[Milestone]) -> MilestoneProgress {
    let completed = items
        .iter()
        .filter(|m| m.status_enum() == MilestoneStatus::Completed)
        .count() as i64;
    MilestoneProgress::new(items.len() as i64, completed)
}

fn validate_create_request(req: &CreateMilestoneRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_name(&req.title, "title") {
        errors.add("title", e);
    }
    if let Err(e) = validate_text(&req.description, "description", 4000) {
        errors.add("description", e);
    }
    if let Err(e) = validate_date(&req.due_date, "due_date") {
        errors.add("due_date", e);
    }

    errors.finish()
}

/// List milestones with completion progress
pub async fn list_milestones(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: User,
) -> Result<Json<MilestoneListResponse>, ApiError> {
    let _ = load_startup(&state.db, &user, &id).await?;

    let items = list_for_startup(&state.db, &id).await?;
    let progress = progress(&items);

    Ok(Json(MilestoneListResponse { items, progress }))
}

/// Create a milestone (founder or admin)
pub async fn create_milestone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<CreateMilestoneRequest>,
) -> Result<(StatusCode, Json<Milestone>), ApiError> {
    let (startup, roles) = load_startup(&state.db, &user, &id).await?;
    if !roles.can_manage() {
        return Err(ApiError::forbidden(
            "Only the founder or an admin can manage milestones",
        ));
    }

    validate_create_request(&req)?;

    let milestone_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO milestones (id, startup_id, title, description, due_date, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 'pending', ?, ?)
        "#,
    )
    .bind(&milestone_id)
    .bind(&id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.due_date)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let milestone = sqlx::query_as::<_, Milestone>("SELECT * FROM milestones WHERE id = ?")
        .bind(&milestone_id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        actions::MILESTONE_CREATE,
        resource_types::MILESTONE,
        Some(&milestone_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(milestone)))
}

async fn fetch_milestone(
    pool: &sqlx::SqlitePool,
    startup_id: &str,
    milestone_id: &str,
) -> Result<Milestone, ApiError> {
    if let Err(e) = validate_uuid(milestone_id, "milestone_id") {
        return Err(ApiError::validation_field("milestone_id", e));
    }

    sqlx::query_as::<_, Milestone>("SELECT * FROM milestones WHERE id = ? AND startup_id = ?")
        .bind(milestone_id)
        .bind(startup_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Milestone not found"))
}

/// Update a milestone (founder or admin). Status may be set directly,
/// e.g. flagging a milestone as delayed.
pub async fn update_milestone(
    State(state): State<Arc<AppState>>,
    Path((id, milestone_id)): Path<(String, String)>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<UpdateMilestoneRequest>,
) -> Result<Json<Milestone>, ApiError> {
    let (startup, roles) = load_startup(&state.db, &user, &id).await?;
    if !roles.can_manage() {
        return Err(ApiError::forbidden(
            "Only the founder or an admin can manage milestones",
        ));
    }

    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref title) = req.title {
        if let Err(e) = validate_name(title, "title") {
            errors.add("title", e);
        }
    }
    if let Some(ref description) = req.description {
        if let Err(e) = validate_text(description, "description", 4000) {
            errors.add("description", e);
        }
    }
    if let Err(e) = validate_date(&req.due_date, "due_date") {
        errors.add("due_date", e);
    }
    let status = match &req.status {
        Some(s) => match MilestoneStatus::from_str(s) {
            Ok(status) => Some(status),
            Err(e) => {
                errors.add("status", e);
                None
            }
        },
        None => None,
    };
    errors.finish()?;

    let milestone = fetch_milestone(&state.db, &id, &milestone_id).await?;

    let now = chrono::Utc::now().to_rfc3339();
    let completed_at = match status {
        Some(MilestoneStatus::Completed)
            if milestone.status_enum() != MilestoneStatus::Completed =>
        {
            Some(now.clone())
        }
        _ => None,
    };

    sqlx::query(
        r#"
        UPDATE milestones SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            due_date = COALESCE(?, due_date),
            status = COALESCE(?, status),
            completed_at = COALESCE(?, completed_at),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.due_date)
    .bind(status.map(|s| s.to_string()))
    .bind(&completed_at)
    .bind(&now)
    .bind(&milestone_id)
    .execute(&state.db)
    .await?;

    let milestone = sqlx::query_as::<_, Milestone>("SELECT * FROM milestones WHERE id = ?")
        .bind(&milestone_id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        actions::MILESTONE_UPDATE,
        resource_types::MILESTONE,
        Some(&milestone_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok(Json(milestone))
}

/// Cycle a milestone one step forward (pending → in_progress → completed;
/// delayed resumes to in_progress)
pub async fn advance_milestone(
    State(state): State<Arc<AppState>>,
    Path((id, milestone_id)): Path<(String, String)>,
    headers: HeaderMap,
    user: User,
) -> Result<Json<Milestone>, ApiError> {
    let (startup, roles) = load_startup(&state.db, &user, &id).await?;
    if !roles.can_manage() {
        return Err(ApiError::forbidden(
            "Only the founder or an admin can manage milestones",
        ));
    }

    let milestone = fetch_milestone(&state.db, &id, &milestone_id).await?;

    let next = milestone
        .status_enum()
        .advanced()
        .ok_or_else(|| ApiError::conflict("Milestone is already completed"))?;

    let now = chrono::Utc::now().to_rfc3339();
    let completed_at = (next == MilestoneStatus::Completed).then(|| now.clone());

    sqlx::query(
        "UPDATE milestones SET status = ?, completed_at = COALESCE(?, completed_at), updated_at = ? WHERE id = ?",
    )
    .bind(next.to_string())
    .bind(&completed_at)
    .bind(&now)
    .bind(&milestone_id)
    .execute(&state.db)
    .await?;

    let milestone = sqlx::query_as::<_, Milestone>("SELECT * FROM milestones WHERE id = ?")
        .bind(&milestone_id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        actions::MILESTONE_ADVANCE,
        resource_types::MILESTONE,
        Some(&milestone_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        Some(serde_json::json!({ "to": next.to_string() })),
    )
    .await;

    Ok(Json(milestone))
}

/// Delete a milestone (founder or admin)
pub async fn delete_milestone(
    State(state): State<Arc<AppState>>,
    Path((id, milestone_id)): Path<(String, String)>,
    headers: HeaderMap,
    user: User,
) -> Result<StatusCode, ApiError> {
    let (startup, roles) = load_startup(&state.db, &user, &id).await?;
    if !roles.can_manage() {
        return Err(ApiError::forbidden(
            "Only the founder or an admin can manage milestones",
        ));
    }

    let milestone = fetch_milestone(&state.db, &id, &milestone_id).await?;

    sqlx::query("DELETE FROM milestones WHERE id = ?")
        .bind(&milestone.id)
        .execute(&state.db)
        .await?;

    audit_log(
        &state,
        actions::MILESTONE_DELETE,
        resource_types::MILESTONE,
        Some(&milestone_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
