//! Task panel endpoints. Lists always come back in the canonical order:
//! incomplete first, then priority, then due date.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, resource_types, sort_tasks, CreateTaskRequest, Task, TaskPriority, TaskStatus,
    UpdateTaskRequest, User,
};
use crate::AppState;

use super::audit::{audit_log, extract_client_ip};
use super::error::{ApiError, ValidationErrorBuilder};
use super::startups::load_startup;
use super::validation::{validate_date, validate_name, validate_text, validate_uuid};

pub(super) async fn list_sorted(
    pool: &sqlx::SqlitePool,
    startup_id: &str,
) -> Result<Vec<Task>, sqlx::Error> {
    let mut tasks = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE startup_id = ?")
        .bind(startup_id)
        .fetch_all(pool)
        .await?;
    sort_tasks(&mut tasks);
    Ok(tasks)
}

/// List tasks in canonical order
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: User,
) -> Result<Json<Vec<Task>>, ApiError> {
    let _ = load_startup(&state.db, &user, &id).await?;

    let tasks = list_sorted(&state.db, &id).await?;
    Ok(Json(tasks))
}

async fn validate_assignee(
    pool: &sqlx::SqlitePool,
    assignee_id: &Option<String>,
) -> Result<(), ApiError> {
    if let Some(assignee) = assignee_id {
        if let Err(e) = validate_uuid(assignee, "assignee_id") {
            return Err(ApiError::validation_field("assignee_id", e));
        }
        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
            .bind(assignee)
            .fetch_optional(pool)
            .await?;
        if exists.is_none() {
            return Err(ApiError::validation_field("assignee_id", "Assignee not found"));
        }
    }
    Ok(())
}

/// Create a task (founder or admin)
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let (startup, roles) = load_startup(&state.db, &user, &id).await?;
    if !roles.can_manage() {
        return Err(ApiError::forbidden(
            "Only the founder or an admin can manage tasks",
        ));
    }

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
    let priority = match &req.priority {
        Some(p) => match TaskPriority::from_str(p) {
            Ok(priority) => priority,
            Err(e) => {
                errors.add("priority", e);
                TaskPriority::Medium
            }
        },
        None => TaskPriority::Medium,
    };
    errors.finish()?;

    validate_assignee(&state.db, &req.assignee_id).await?;

    let task_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO tasks (id, startup_id, title, description, status, priority,
                           assignee_id, due_date, created_at, updated_at)
        VALUES (?, ?, ?, ?, 'todo', ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&task_id)
    .bind(&id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(priority.to_string())
    .bind(&req.assignee_id)
    .bind(&req.due_date)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
        .bind(&task_id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        actions::TASK_CREATE,
        resource_types::TASK,
        Some(&task_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(task)))
}

async fn fetch_task(
    pool: &sqlx::SqlitePool,
    startup_id: &str,
    task_id: &str,
) -> Result<Task, ApiError> {
    if let Err(e) = validate_uuid(task_id, "task_id") {
        return Err(ApiError::validation_field("task_id", e));
    }

    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ? AND startup_id = ?")
        .bind(task_id)
        .bind(startup_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))
}

/// Update a task (founder or admin). Status changes cover the row-level
/// cycle controls: todo → in_progress → done in either direction.
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path((id, task_id)): Path<(String, String)>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let (startup, roles) = load_startup(&state.db, &user, &id).await?;
    if !roles.can_manage() {
        return Err(ApiError::forbidden(
            "Only the founder or an admin can manage tasks",
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
    if let Some(ref status) = req.status {
        if TaskStatus::from_str(status).is_err() {
            errors.add("status", "Must be one of: todo, in_progress, done");
        }
    }
    if let Some(ref priority) = req.priority {
        if TaskPriority::from_str(priority).is_err() {
            errors.add("priority", "Must be one of: high, medium, low");
        }
    }
    errors.finish()?;

    validate_assignee(&state.db, &req.assignee_id).await?;

    let task = fetch_task(&state.db, &id, &task_id).await?;
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE tasks SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            status = COALESCE(?, status),
            priority = COALESCE(?, priority),
            assignee_id = COALESCE(?, assignee_id),
            due_date = COALESCE(?, due_date),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.status)
    .bind(&req.priority)
    .bind(&req.assignee_id)
    .bind(&req.due_date)
    .bind(&now)
    .bind(&task.id)
    .execute(&state.db)
    .await?;

    let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
        .bind(&task_id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        actions::TASK_UPDATE,
        resource_types::TASK,
        Some(&task_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok(Json(task))
}

/// Delete a task (founder or admin)
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path((id, task_id)): Path<(String, String)>,
    headers: HeaderMap,
    user: User,
) -> Result<StatusCode, ApiError> {
    let (startup, roles) = load_startup(&state.db, &user, &id).await?;
    if !roles.can_manage() {
        return Err(ApiError::forbidden(
            "Only the founder or an admin can manage tasks",
        ));
    }

    let task = fetch_task(&state.db, &id, &task_id).await?;

    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(&task.id)
        .execute(&state.db)
        .await?;

    audit_log(
        &state,
        actions::TASK_DELETE,
        resource_types::TASK,
        Some(&task_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
