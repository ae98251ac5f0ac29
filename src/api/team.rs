//! Team panel endpoints: the people behind a startup.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, resource_types, CreateTeamMemberRequest, TeamMember, UpdateTeamMemberRequest, User,
};
use crate::AppState;

use super::audit::{audit_log, extract_client_ip};
use super::error::{ApiError, ValidationErrorBuilder};
use super::startups::load_startup;
use super::validation::{validate_email, validate_name, validate_text, validate_uuid};

pub(super) async fn list_for_startup(
    pool: &sqlx::SqlitePool,
    startup_id: &str,
) -> Result<Vec<TeamMember>, sqlx::Error> {
    sqlx::query_as::<_, TeamMember>(
        "SELECT * FROM team_members WHERE startup_id = ? ORDER BY created_at ASC",
    )
    .bind(startup_id)
    .fetch_all(pool)
    .await
}

/// List team members for a startup
pub async fn list_members(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: User,
) -> Result<Json<Vec<TeamMember>>, ApiError> {
    let _ = load_startup(&state.db, &user, &id).await?;
    let members = list_for_startup(&state.db, &id).await?;
    Ok(Json(members))
}

fn validate_member_fields(
    name: Option<&str>,
    title: Option<&str>,
    email: &Option<String>,
    bio: Option<&str>,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(name) = name {
        if let Err(e) = validate_name(name, "name") {
            errors.add("name", e);
        }
    }
    if let Some(title) = title {
        if let Err(e) = validate_text(title, "title", 120) {
            errors.add("title", e);
        }
    }
    if let Some(email) = email {
        if !email.is_empty() {
            if let Err(e) = validate_email(email) {
                errors.add("email", e);
            }
        }
    }
    if let Some(bio) = bio {
        if let Err(e) = validate_text(bio, "bio", 2000) {
            errors.add("bio", e);
        }
    }

    errors.finish()
}

/// Add a team member (founder or admin)
pub async fn add_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<CreateTeamMemberRequest>,
) -> Result<(StatusCode, Json<TeamMember>), ApiError> {
    let (startup, roles) = load_startup(&state.db, &user, &id).await?;
    if !roles.can_manage() {
        return Err(ApiError::forbidden(
            "Only the founder or an admin can manage the team",
        ));
    }

    validate_member_fields(Some(&req.name), Some(&req.title), &req.email, Some(&req.bio))?;

    let member_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO team_members (id, startup_id, name, title, email, bio, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&member_id)
    .bind(&id)
    .bind(&req.name)
    .bind(&req.title)
    .bind(&req.email)
    .bind(&req.bio)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let member = sqlx::query_as::<_, TeamMember>("SELECT * FROM team_members WHERE id = ?")
        .bind(&member_id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        actions::TEAM_MEMBER_ADD,
        resource_types::TEAM_MEMBER,
        Some(&member_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(member)))
}

/// Update a team member (founder or admin)
pub async fn update_member(
    State(state): State<Arc<AppState>>,
    Path((id, member_id)): Path<(String, String)>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<UpdateTeamMemberRequest>,
) -> Result<Json<TeamMember>, ApiError> {
    if let Err(e) = validate_uuid(&member_id, "member_id") {
        return Err(ApiError::validation_field("member_id", e));
    }

    let (startup, roles) = load_startup(&state.db, &user, &id).await?;
    if !roles.can_manage() {
        return Err(ApiError::forbidden(
            "Only the founder or an admin can manage the team",
        ));
    }

    validate_member_fields(
        req.name.as_deref(),
        req.title.as_deref(),
        &req.email,
        req.bio.as_deref(),
    )?;

    let existing = sqlx::query_as::<_, TeamMember>(
        "SELECT * FROM team_members WHERE id = ? AND startup_id = ?",
    )
    .bind(&member_id)
    .bind(&id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Team member not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE team_members SET
            name = COALESCE(?, name),
            title = COALESCE(?, title),
            email = COALESCE(?, email),
            bio = COALESCE(?, bio),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.name)
    .bind(&req.title)
    .bind(&req.email)
    .bind(&req.bio)
    .bind(&now)
    .bind(&existing.id)
    .execute(&state.db)
    .await?;

    let member = sqlx::query_as::<_, TeamMember>("SELECT * FROM team_members WHERE id = ?")
        .bind(&member_id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        actions::TEAM_MEMBER_UPDATE,
        resource_types::TEAM_MEMBER,
        Some(&member_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok(Json(member))
}

/// Remove a team member (founder or admin)
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    Path((id, member_id)): Path<(String, String)>,
    headers: HeaderMap,
    user: User,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&member_id, "member_id") {
        return Err(ApiError::validation_field("member_id", e));
    }

    let (startup, roles) = load_startup(&state.db, &user, &id).await?;
    if !roles.can_manage() {
        return Err(ApiError::forbidden(
            "Only the founder or an admin can manage the team",
        ));
    }

    let result = sqlx::query("DELETE FROM team_members WHERE id = ? AND startup_id = ?")
        .bind(&member_id)
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Team member not found"));
    }

    audit_log(
        &state,
        actions::TEAM_MEMBER_REMOVE,
        resource_types::TEAM_MEMBER,
        Some(&member_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
