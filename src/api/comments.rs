//! Discussion panel endpoints: threaded comments, one reply level deep.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, partition_threads, resource_types, Comment, CommentThread, CommentWithAuthor,
    CreateCommentRequest, StartupStatus, UpdateCommentRequest, User,
};
use crate::AppState;

use super::audit::{audit_log, extract_client_ip};
use super::error::ApiError;
use super::startups::load_startup;
use super::validation::{validate_text, validate_uuid};

pub(super) async fn list_threads_for(
    pool: &sqlx::SqlitePool,
    startup_id: &str,
) -> Result<Vec<CommentThread>, sqlx::Error> {
    let comments = sqlx::query_as::<_, CommentWithAuthor>(
        r#"
        SELECT c.*, u.name as author_name
        FROM comments c
        INNER JOIN users u ON c.author_id = u.id
        WHERE c.startup_id = ?
        ORDER BY c.created_at ASC
        "#,
    )
    .bind(startup_id)
    .fetch_all(pool)
    .await?;

    Ok(partition_threads(comments))
}

/// List the discussion as threads (roots with replies, oldest first)
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: User,
) -> Result<Json<Vec<CommentThread>>, ApiError> {
    let _ = load_startup(&state.db, &user, &id).await?;
    let threads = list_threads_for(&state.db, &id).await?;
    Ok(Json(threads))
}

fn validate_body(body: &str) -> Result<(), ApiError> {
    if body.trim().is_empty() {
        return Err(ApiError::validation_field("body", "Comment body is required"));
    }
    validate_text(body, "body", 8000).map_err(|e| ApiError::validation_field("body", e))
}

/// Post a comment or a reply. Any authenticated user may discuss a
/// non-draft startup; replies must target a root comment on the same
/// startup.
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let (startup, _) = load_startup(&state.db, &user, &id).await?;

    if startup.status_enum() == StartupStatus::Draft {
        return Err(ApiError::bad_request("Drafts do not have a discussion"));
    }

    validate_body(&req.body)?;

    if let Some(parent_id) = &req.parent_id {
        if let Err(e) = validate_uuid(parent_id, "parent_id") {
            return Err(ApiError::validation_field("parent_id", e));
        }

        let parent = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE id = ? AND startup_id = ?",
        )
        .bind(parent_id)
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Parent comment not found"))?;

        // One level of threading only
        if parent.parent_id.is_some() {
            return Err(ApiError::validation_field(
                "parent_id",
                "Replies to replies are not allowed",
            ));
        }
    }

    let comment_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO comments (id, startup_id, author_id, parent_id, body, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&comment_id)
    .bind(&id)
    .bind(&user.id)
    .bind(&req.parent_id)
    .bind(&req.body)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
        .bind(&comment_id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        actions::COMMENT_CREATE,
        resource_types::COMMENT,
        Some(&comment_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Edit a comment (author only)
pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    Path((id, comment_id)): Path<(String, String)>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    if let Err(e) = validate_uuid(&comment_id, "comment_id") {
        return Err(ApiError::validation_field("comment_id", e));
    }

    let (startup, _) = load_startup(&state.db, &user, &id).await?;

    validate_body(&req.body)?;

    let comment = sqlx::query_as::<_, Comment>(
        "SELECT * FROM comments WHERE id = ? AND startup_id = ?",
    )
    .bind(&comment_id)
    .bind(&id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    if comment.author_id != user.id {
        return Err(ApiError::forbidden("You can only edit your own comments"));
    }

    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query("UPDATE comments SET body = ?, updated_at = ? WHERE id = ?")
        .bind(&req.body)
        .bind(&now)
        .bind(&comment.id)
        .execute(&state.db)
        .await?;

    let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
        .bind(&comment_id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        actions::COMMENT_UPDATE,
        resource_types::COMMENT,
        Some(&comment_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok(Json(comment))
}

/// Delete a comment (author or admin). Replies cascade with their root.
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path((id, comment_id)): Path<(String, String)>,
    headers: HeaderMap,
    user: User,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&comment_id, "comment_id") {
        return Err(ApiError::validation_field("comment_id", e));
    }

    let (startup, roles) = load_startup(&state.db, &user, &id).await?;

    let comment = sqlx::query_as::<_, Comment>(
        "SELECT * FROM comments WHERE id = ? AND startup_id = ?",
    )
    .bind(&comment_id)
    .bind(&id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    if comment.author_id != user.id && !roles.is_admin {
        return Err(ApiError::forbidden("You can only delete your own comments"));
    }

    sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(&comment.id)
        .execute(&state.db)
        .await?;

    audit_log(
        &state,
        actions::COMMENT_DELETE,
        resource_types::COMMENT,
        Some(&comment_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
