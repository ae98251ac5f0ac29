//! Startup team member models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeamMember {
    pub id: String,
    pub startup_id: String,
    pub name: String,
    pub title: String,
    pub email: Option<String>,
    pub bio: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTeamMemberRequest {
    pub name: String,
    #[serde(default)]
    pub title: String,
    pub email: Option<String>,
    #[serde(default)]
    pub bio: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTeamMemberRequest {
    pub name: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
}
