//! Document metadata models. File bytes live wherever `url` points; this
//! service only tracks the records.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: String,
    pub startup_id: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub url: String,
    pub uploaded_by: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub file_name: String,
    pub content_type: Option<String>,
    #[serde(default)]
    pub size_bytes: i64,
    pub url: String,
}
