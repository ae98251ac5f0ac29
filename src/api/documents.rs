//! Document panel endpoints. Records are metadata; the bytes live behind
//! the stored URL.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{actions, resource_types, CreateDocumentRequest, Document, User};
use crate::AppState;

use super::audit::{audit_log, extract_client_ip};
use super::error::{ApiError, ValidationErrorBuilder};
use super::startups::load_startup;
use super::validation::{validate_name, validate_url, validate_uuid};

pub(super) async fn list_for_startup(
    pool: &sqlx::SqlitePool,
    startup_id: &str,
) -> Result<Vec<Document>, sqlx::Error> {
    sqlx::query_as::<_, Document>(
        "SELECT * FROM documents WHERE startup_id = ? ORDER BY created_at DESC",
    )
    .bind(startup_id)
    .fetch_all(pool)
    .await
}

/// List documents for a startup
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: User,
) -> Result<Json<Vec<Document>>, ApiError> {
    let _ = load_startup(&state.db, &user, &id).await?;
    let documents = list_for_startup(&state.db, &id).await?;
    Ok(Json(documents))
}

/// Register a document (founder or admin)
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let (_, roles) = load_startup(&state.db, &user, &id).await?;
    if !roles.can_manage() {
        return Err(ApiError::forbidden(
            "Only the founder or an admin can add documents",
        ));
    }

    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_name(&req.file_name, "file_name") {
        errors.add("file_name", e);
    }
    if let Err(e) = validate_url(&req.url) {
        errors.add("url", e);
    }
    if req.size_bytes < 0 {
        errors.add("size_bytes", "Size cannot be negative");
    }
    errors.finish()?;

    let document_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let content_type = req
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    sqlx::query(
        r#"
        INSERT INTO documents (id, startup_id, file_name, content_type, size_bytes, url, uploaded_by, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&document_id)
    .bind(&id)
    .bind(&req.file_name)
    .bind(&content_type)
    .bind(req.size_bytes)
    .bind(&req.url)
    .bind(&user.id)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let document = sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = ?")
        .bind(&document_id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        actions::DOCUMENT_CREATE,
        resource_types::DOCUMENT,
        Some(&document_id),
        Some(&req.file_name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(document)))
}

/// Delete a document (uploader, founder, or admin)
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path((id, document_id)): Path<(String, String)>,
    headers: HeaderMap,
    user: User,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&document_id, "document_id") {
        return Err(ApiError::validation_field("document_id", e));
    }

    let (_, roles) = load_startup(&state.db, &user, &id).await?;

    let document = sqlx::query_as::<_, Document>(
        "SELECT * FROM documents WHERE id = ? AND startup_id = ?",
    )
    .bind(&document_id)
    .bind(&id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Document not found"))?;

    let is_uploader = document.uploaded_by.as_deref() == Some(user.id.as_str());
    if !is_uploader && !roles.can_manage() {
        return Err(ApiError::forbidden(
            "You do not have permission to delete this document",
        ));
    }

    sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(&document.id)
        .execute(&state.db)
        .await?;

    audit_log(
        &state,
        actions::DOCUMENT_DELETE,
        resource_types::DOCUMENT,
        Some(&document_id),
        Some(&document.file_name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
