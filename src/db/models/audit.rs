//! Audit log models for tracking user actions.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Audit log entry for tracking user actions
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub resource_name: Option<String>,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub details: Option<String>,
    pub created_at: String,
}

/// Response for listing audit logs with pagination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogListResponse {
    pub items: Vec<AuditLog>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// Query parameters for filtering audit logs
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuditLogQuery {
    /// Filter by action (e.g., "startup.submit")
    pub action: Option<String>,
    /// Filter by resource type (e.g., "startup", "review")
    pub resource_type: Option<String>,
    /// Filter by resource ID
    pub resource_id: Option<String>,
    /// Filter by user ID
    pub user_id: Option<String>,
    /// Start date for filtering (ISO 8601)
    pub start_date: Option<String>,
    /// End date for filtering (ISO 8601)
    pub end_date: Option<String>,
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<i64>,
    /// Items per page (defaults to 50, max 100)
    pub per_page: Option<i64>,
}

/// Common audit action types
pub mod actions {
    pub const STARTUP_CREATE: &str = "startup.create";
    pub const STARTUP_UPDATE: &str = "startup.update";
    pub const STARTUP_DELETE: &str = "startup.delete";
    pub const STARTUP_STATUS_CHANGE: &str = "startup.status_change";

    pub const REVIEW_CREATE: &str = "review.create";
    pub const REVIEW_UPDATE: &str = "review.update";
    pub const REVIEW_DELETE: &str = "review.delete";

    pub const MILESTONE_CREATE: &str = "milestone.create";
    pub const MILESTONE_UPDATE: &str = "milestone.update";
    pub const MILESTONE_DELETE: &str = "milestone.delete";
    pub const MILESTONE_ADVANCE: &str = "milestone.advance";

    pub const TASK_CREATE: &str = "task.create";
    pub const TASK_UPDATE: &str = "task.update";
    pub const TASK_DELETE: &str = "task.delete";

    pub const SPONSORSHIP_CREATE: &str = "sponsorship.create";
    pub const SPONSORSHIP_DELETE: &str = "sponsorship.delete";
    pub const EXPENSE_CREATE: &str = "expense.create";
    pub const EXPENSE_UPDATE: &str = "expense.update";
    pub const EXPENSE_DELETE: &str = "expense.delete";

    pub const DOCUMENT_CREATE: &str = "document.create";
    pub const DOCUMENT_DELETE: &str = "document.delete";

    pub const COMMENT_CREATE: &str = "comment.create";
    pub const COMMENT_UPDATE: &str = "comment.update";
    pub const COMMENT_DELETE: &str = "comment.delete";

    pub const TEAM_MEMBER_ADD: &str = "team_member.add";
    pub const TEAM_MEMBER_UPDATE: &str = "team_member.update";
    pub const TEAM_MEMBER_REMOVE: &str = "team_member.remove";

    pub const AUTH_LOGIN: &str = "auth.login";
    pub const AUTH_REGISTER: &str = "auth.register";
    pub const AUTH_SETUP: &str = "auth.setup";
}

/// Common resource types
pub mod resource_types {
    pub const STARTUP: &str = "startup";
    pub const REVIEW: &str = "review";
    pub const MILESTONE: &str = "milestone";
    pub const TASK: &str = "task";
    pub const SPONSORSHIP: &str = "sponsorship";
    pub const EXPENSE: &str = "expense";
    pub const DOCUMENT: &str = "document";
    pub const COMMENT: &str = "comment";
    pub const TEAM_MEMBER: &str = "team_member";
    pub const USER: &str = "user";
}

/// Log an audit event to the database
pub async fn log_audit(
    db: &SqlitePool,
    action: &str,
    resource_type: &str,
    resource_id: Option<&str>,
    resource_name: Option<&str>,
    user_id: Option<&str>,
    ip_address: Option<&str>,
    details: Option<serde_json::Value>,
) -> Result<(), sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let details_json = details.map(|d| d.to_string());

    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, action, resource_type, resource_id, resource_name, user_id, ip_address, details, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(action)
    .bind(resource_type)
    .bind(resource_id)
    .bind(resource_name)
    .bind(user_id)
    .bind(ip_address)
    .bind(&details_json)
    .bind(&now)
    .execute(db)
    .await?;

    tracing::debug!(
        action = action,
        resource_type = resource_type,
        resource_id = resource_id,
        user_id = user_id,
        "Audit log recorded"
    );

    Ok(())
}

/// List audit logs with filtering and pagination
pub async fn list_audit_logs(
    db: &SqlitePool,
    query: &AuditLogQuery,
) -> Result<AuditLogListResponse, sqlx::Error> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(50).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // Build dynamic WHERE clause
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(action) = &query.action {
        conditions.push("action = ?");
        bindings.push(action.clone());
    }

    if let Some(resource_type) = &query.resource_type {
        conditions.push("resource_type = ?");
        bindings.push(resource_type.clone());
    }

    if let Some(resource_id) = &query.resource_id {
        conditions.push("resource_id = ?");
        bindings.push(resource_id.clone());
    }

    if let Some(user_id) = &query.user_id {
        conditions.push("user_id = ?");
        bindings.push(user_id.clone());
    }

    if let Some(start_date) = &query.start_date {
        conditions.push("created_at >= ?");
        bindings.push(start_date.clone());
    }

    if let Some(end_date) = &query.end_date {
        conditions.push("created_at <= ?");
        bindings.push(end_date.clone());
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM audit_logs {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for binding in &bindings {
        count_query = count_query.bind(binding);
    }
    let total = count_query.fetch_one(db).await?;

    let sql = format!(
        "SELECT * FROM audit_logs {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        where_clause
    );
    let mut query_builder = sqlx::query_as::<_, AuditLog>(&sql);
    for binding in &bindings {
        query_builder = query_builder.bind(binding);
    }
    query_builder = query_builder.bind(per_page).bind(offset);

    let items = query_builder.fetch_all(db).await?;

    let total_pages = (total as f64 / per_page as f64).ceil() as i64;

    Ok(AuditLogListResponse {
        items,
        total,
        page,
        per_page,
        total_pages,
    })
}
