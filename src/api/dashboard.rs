//! Dashboard endpoint: call-wide statistics for signed-in users.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::db::{DashboardStats, User};
use crate::AppState;

use super::error::ApiError;

/// Get call-wide statistics
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    _user: User,
) -> Result<Json<DashboardStats>, ApiError> {
    let stats = DashboardStats::get(&state.db).await?;
    Ok(Json(stats))
}
