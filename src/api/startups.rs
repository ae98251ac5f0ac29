//! Startup endpoints: CRUD, listing, and status transitions.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, resource_types, ChangeStatusRequest, CreateStartupRequest, FinancialSummary,
    FundingStage, Startup, StartupDetail, StartupListQuery, StartupListResponse, StartupSeedCounts,
    StartupStatus, TransitionError, UpdateStartupRequest, User, UserRole,
};
use crate::workflow::{visible_tabs, RoleSet};
use crate::AppState;

use super::audit::{audit_log, extract_client_ip};
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    validate_funding_goal, validate_name, validate_tags, validate_text, validate_uuid,
};

/// Fetch a startup row or 404
pub(super) async fn fetch_startup(
    pool: &sqlx::SqlitePool,
    id: &str,
) -> Result<Startup, ApiError> {
    if let Err(e) = validate_uuid(id, "startup_id") {
        return Err(ApiError::validation_field("startup_id", e));
    }

    sqlx::query_as::<_, Startup>("SELECT * FROM startups WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Startup not found"))
}

/// Load a startup and the caller's role set, enforcing draft visibility:
/// drafts are only readable by their founder and admins.
pub(super) async fn load_startup(
    pool: &sqlx::SqlitePool,
    user: &User,
    id: &str,
) -> Result<(Startup, RoleSet), ApiError> {
    let startup = fetch_startup(pool, id).await?;
    let roles = RoleSet::resolve(Some(user), &startup.founder_id);

    if startup.status_enum() == StartupStatus::Draft && !roles.can_manage() {
        return Err(ApiError::forbidden(
            "You do not have access to this startup",
        ));
    }

    Ok((startup, roles))
}

fn validate_create_request(req: &CreateStartupRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_name(&req.name, "name") {
        errors.add("name", e);
    }
    if let Err(e) = validate_text(&req.description, "description", 4000) {
        errors.add("description", e);
    }
    if let Err(e) = validate_text(&req.pitch, "pitch", 10_000) {
        errors.add("pitch", e);
    }
    if let Err(e) = validate_tags(&req.industry_tags) {
        errors.add("industry_tags", e);
    }
    if FundingStage::from_str(&req.funding_stage).is_err() {
        errors.add(
            "funding_stage",
            "Must be one of: idea, pre_seed, seed, series_a, growth",
        );
    }
    if let Err(e) = validate_funding_goal(req.funding_goal) {
        errors.add("funding_goal", e);
    }

    errors.finish()
}

fn validate_update_request(req: &UpdateStartupRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(ref name) = req.name {
        if let Err(e) = validate_name(name, "name") {
            errors.add("name", e);
        }
    }
    if let Some(ref description) = req.description {
        if let Err(e) = validate_text(description, "description", 4000) {
            errors.add("description", e);
        }
    }
    if let Some(ref pitch) = req.pitch {
        if let Err(e) = validate_text(pitch, "pitch", 10_000) {
            errors.add("pitch", e);
        }
    }
    if let Some(ref tags) = req.industry_tags {
        if let Err(e) = validate_tags(tags) {
            errors.add("industry_tags", e);
        }
    }
    if let Some(ref stage) = req.funding_stage {
        if FundingStage::from_str(stage).is_err() {
            errors.add(
                "funding_stage",
                "Must be one of: idea, pre_seed, seed, series_a, growth",
            );
        }
    }
    if let Some(goal) = req.funding_goal {
        if let Err(e) = validate_funding_goal(goal) {
            errors.add("funding_goal", e);
        }
    }

    errors.finish()
}

/// List startups with filters and pagination. Drafts belonging to other
/// founders are hidden unless the caller is an admin.
pub async fn list_startups(
    State(state): State<Arc<AppState>>,
    user: User,
    Query(query): Query<StartupListQuery>,
) -> Result<Json<StartupListResponse>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(25).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(status) = &query.status {
        StartupStatus::from_str(status)
            .map_err(|e| ApiError::validation_field("status", e))?;
        conditions.push("status = ?".to_string());
        bindings.push(status.clone());
    }

    if let Some(industry) = &query.industry {
        // Tags are stored as a JSON array of strings
        conditions.push("industry_tags LIKE ?".to_string());
        bindings.push(format!("%\"{}\"%", industry));
    }

    if let Some(founder_id) = &query.founder_id {
        conditions.push("founder_id = ?".to_string());
        bindings.push(founder_id.clone());
    }

    if !user.is_admin() {
        conditions.push("(status != 'draft' OR founder_id = ?)".to_string());
        bindings.push(user.id.clone());
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM startups {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for binding in &bindings {
        count_query = count_query.bind(binding);
    }
    let total = count_query.fetch_one(&state.db).await?;

    let sql = format!(
        "SELECT * FROM startups {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        where_clause
    );
    let mut list_query = sqlx::query_as::<_, Startup>(&sql);
    for binding in &bindings {
        list_query = list_query.bind(binding);
    }
    list_query = list_query.bind(per_page).bind(offset);

    let items = list_query.fetch_all(&state.db).await?;
    let total_pages = (total as f64 / per_page as f64).ceil() as i64;

    Ok(Json(StartupListResponse {
        items,
        total,
        page,
        per_page,
        total_pages,
    }))
}

/// Create a startup as a draft owned by the caller
pub async fn create_startup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<CreateStartupRequest>,
) -> Result<(StatusCode, Json<Startup>), ApiError> {
    let role = user.role_enum();
    if !matches!(role, UserRole::Founder | UserRole::Admin) {
        return Err(ApiError::forbidden(
            "Only founder and admin accounts can create startups",
        ));
    }

    validate_create_request(&req)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let tags_json = serde_json::to_string(&req.industry_tags)
        .map_err(|_| ApiError::internal("Failed to encode industry tags"))?;

    sqlx::query(
        r#"
        INSERT INTO startups (id, name, description, pitch, industry_tags, funding_stage,
                              funding_goal, status, founder_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'draft', ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(&req.pitch)
    .bind(&tags_json)
    .bind(&req.funding_stage)
    .bind(req.funding_goal)
    .bind(&user.id)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let startup = fetch_startup(&state.db, &id).await?;

    tracing::info!("Created startup '{}' for founder {}", startup.name, user.email);

    audit_log(
        &state,
        actions::STARTUP_CREATE,
        resource_types::STARTUP,
        Some(&id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(startup)))
}

/// Get a startup with embedded panel seed data and the caller's tab set
pub async fn get_startup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: User,
) -> Result<Json<StartupDetail>, ApiError> {
    let (startup, roles) = load_startup(&state.db, &user, &id).await?;

    let founder_name: Option<(String,)> = sqlx::query_as("SELECT name FROM users WHERE id = ?")
        .bind(&startup.founder_id)
        .fetch_optional(&state.db)
        .await?;

    let counts = seed_counts(&state.db, &id).await?;
    let financials = financial_summary(&state.db, &id).await?;

    let tabs = visible_tabs(startup.status_enum(), &roles)
        .into_iter()
        .map(|t| t.as_str().to_string())
        .collect();

    Ok(Json(StartupDetail {
        startup,
        founder_name: founder_name.map(|(n,)| n).unwrap_or_default(),
        counts,
        financials,
        visible_tabs: tabs,
    }))
}

pub(super) async fn seed_counts(
    pool: &sqlx::SqlitePool,
    startup_id: &str,
) -> Result<StartupSeedCounts, ApiError> {
    let review_count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE startup_id = ?")
            .bind(startup_id)
            .fetch_one(pool)
            .await?;
    let milestones: (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(status = 'completed'), 0) FROM milestones WHERE startup_id = ?",
    )
    .bind(startup_id)
    .fetch_one(pool)
    .await?;
    let tasks: (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(status = 'done'), 0) FROM tasks WHERE startup_id = ?",
    )
    .bind(startup_id)
    .fetch_one(pool)
    .await?;
    let document_count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM documents WHERE startup_id = ?")
            .bind(startup_id)
            .fetch_one(pool)
            .await?;
    let comment_count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM comments WHERE startup_id = ?")
            .bind(startup_id)
            .fetch_one(pool)
            .await?;
    let team_member_count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM team_members WHERE startup_id = ?")
            .bind(startup_id)
            .fetch_one(pool)
            .await?;

    Ok(StartupSeedCounts {
        review_count: review_count.0,
        milestone_count: milestones.0,
        milestones_completed: milestones.1,
        task_count: tasks.0,
        tasks_done: tasks.1,
        document_count: document_count.0,
        comment_count: comment_count.0,
        team_member_count: team_member_count.0,
    })
}

pub(super) async fn financial_summary(
    pool: &sqlx::SqlitePool,
    startup_id: &str,
) -> Result<FinancialSummary, ApiError> {
    let sponsored: (Option<i64>,) =
        sqlx::query_as("SELECT SUM(amount) FROM sponsorships WHERE startup_id = ?")
            .bind(startup_id)
            .fetch_one(pool)
            .await?;
    let expenses: (Option<i64>,) =
        sqlx::query_as("SELECT SUM(amount) FROM expenses WHERE startup_id = ?")
            .bind(startup_id)
            .fetch_one(pool)
            .await?;

    Ok(FinancialSummary::new(
        sponsored.0.unwrap_or(0),
        expenses.0.unwrap_or(0),
    ))
}

/// Update a startup's editable fields. Founders may edit up to submission;
/// later changes require an admin.
pub async fn update_startup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<UpdateStartupRequest>,
) -> Result<Json<Startup>, ApiError> {
    validate_update_request(&req)?;

    let (startup, roles) = load_startup(&state.db, &user, &id).await?;
    if !roles.can_manage() {
        return Err(ApiError::forbidden("Only the founder or an admin can edit this startup"));
    }

    let status = startup.status_enum();
    if !matches!(status, StartupStatus::Draft | StartupStatus::Submitted) && !roles.is_admin {
        return Err(ApiError::forbidden(
            "Startups under review can only be edited by an admin",
        ));
    }

    let tags_json = match &req.industry_tags {
        Some(tags) => Some(
            serde_json::to_string(tags)
                .map_err(|_| ApiError::internal("Failed to encode industry tags"))?,
        ),
        None => None,
    };
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE startups SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            pitch = COALESCE(?, pitch),
            industry_tags = COALESCE(?, industry_tags),
            funding_stage = COALESCE(?, funding_stage),
            funding_goal = COALESCE(?, funding_goal),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.name)
    .bind(&req.description)
    .bind(&req.pitch)
    .bind(&tags_json)
    .bind(&req.funding_stage)
    .bind(req.funding_goal)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let startup = fetch_startup(&state.db, &id).await?;

    audit_log(
        &state,
        actions::STARTUP_UPDATE,
        resource_types::STARTUP,
        Some(&id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok(Json(startup))
}

/// Delete a startup. Founders may delete their own draft; admins any.
pub async fn delete_startup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    user: User,
) -> Result<StatusCode, ApiError> {
    let (startup, roles) = load_startup(&state.db, &user, &id).await?;

    let allowed = roles.is_admin
        || (roles.is_founder && startup.status_enum() == StartupStatus::Draft);
    if !allowed {
        return Err(ApiError::forbidden(
            "Only an admin can delete a startup after submission",
        ));
    }

    sqlx::query("DELETE FROM startups WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    tracing::info!("Deleted startup {} by user {}", id, user.email);

    audit_log(
        &state,
        actions::STARTUP_DELETE,
        resource_types::STARTUP,
        Some(&id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Move a startup along the status state machine
pub async fn change_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<Json<Startup>, ApiError> {
    let (startup, roles) = load_startup(&state.db, &user, &id).await?;
    let current = startup.status_enum();
    let next = req.status;

    let next = match current.transition_to(next) {
        Ok(next) => next,
        Err(err @ TransitionError::AlreadyInStatus(_)) => {
            return Err(ApiError::conflict(err.to_string()));
        }
        Err(err @ TransitionError::Illegal { .. }) => {
            return Err(ApiError::validation_field("status", err.to_string()));
        }
    };

    if current.transition_requires_admin(next) {
        if !roles.is_admin {
            return Err(ApiError::forbidden("This status change requires an admin"));
        }
    } else if !roles.can_manage() {
        return Err(ApiError::forbidden(
            "Only the founder or an admin can change this startup's status",
        ));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let submitted_at = if next == StartupStatus::Submitted {
        Some(now.clone())
    } else {
        None
    };
    let decided_at = if matches!(next, StartupStatus::Accepted | StartupStatus::Rejected) {
        Some(now.clone())
    } else {
        None
    };

    sqlx::query(
        r#"
        UPDATE startups SET
            status = ?,
            submitted_at = COALESCE(?, submitted_at),
            decided_at = COALESCE(?, decided_at),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(next.to_string())
    .bind(&submitted_at)
    .bind(&decided_at)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let updated = fetch_startup(&state.db, &id).await?;

    tracing::info!(
        startup_id = %id,
        from = %current,
        to = %next,
        "Startup status changed"
    );

    audit_log(
        &state,
        actions::STARTUP_STATUS_CHANGE,
        resource_types::STARTUP,
        Some(&id),
        Some(&updated.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        Some(serde_json::json!({ "from": current.to_string(), "to": next.to_string() })),
    )
    .await;

    Ok(Json(updated))
}
