//! Public, unauthenticated endpoints: sponsorship opportunities and the
//! latest portfolio updates. Only accepted/completed startups are exposed.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::db::Startup;
use crate::AppState;

use super::error::ApiError;
use super::validation::validate_uuid;

/// An accepted startup open for sponsorship
#[derive(Debug, Serialize)]
pub struct SponsorshipOpportunity {
    pub id: String,
    pub name: String,
    pub description: String,
    pub industry_tags: Vec<String>,
    pub funding_stage: String,
    /// Target raise in integer cents (0 when unset)
    pub funding_goal: i64,
    /// Total sponsored so far in integer cents
    pub raised: i64,
    /// Remaining toward the goal, never negative; None when no goal is set
    pub remaining: Option<i64>,
    pub accepted_at: Option<String>,
}

impl SponsorshipOpportunity {
    fn build(startup: Startup, raised: i64) -> Self {
        let remaining = if startup.funding_goal > 0 {
            Some((startup.funding_goal - raised).max(0))
        } else {
            None
        };
        let industry_tags = startup.tags();
        Self {
            id: startup.id,
            name: startup.name,
            description: startup.description,
            industry_tags,
            funding_stage: startup.funding_stage,
            funding_goal: startup.funding_goal,
            raised,
            remaining,
            accepted_at: startup.decided_at,
        }
    }
}

async fn raised_for(pool: &sqlx::SqlitePool, startup_id: &str) -> Result<i64, sqlx::Error> {
    let raised: (Option<i64>,) =
        sqlx::query_as("SELECT SUM(amount) FROM sponsorships WHERE startup_id = ?")
            .bind(startup_id)
            .fetch_one(pool)
            .await?;
    Ok(raised.0.unwrap_or(0))
}

/// List accepted startups open for sponsorship
pub async fn list_opportunities(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SponsorshipOpportunity>>, ApiError> {
    let startups = sqlx::query_as::<_, Startup>(
        "SELECT * FROM startups WHERE status = 'accepted' ORDER BY decided_at DESC",
    )
    .fetch_all(&state.db)
    .await?;

    let mut opportunities = Vec::with_capacity(startups.len());
    for startup in startups {
        let raised = raised_for(&state.db, &startup.id).await?;
        opportunities.push(SponsorshipOpportunity::build(startup, raised));
    }

    Ok(Json(opportunities))
}

/// Get one sponsorship opportunity
pub async fn get_opportunity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SponsorshipOpportunity>, ApiError> {
    if let Err(e) = validate_uuid(&id, "startup_id") {
        return Err(ApiError::validation_field("startup_id", e));
    }

    let startup = sqlx::query_as::<_, Startup>(
        "SELECT * FROM startups WHERE id = ? AND status = 'accepted'",
    )
    .bind(&id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Sponsorship opportunity not found"))?;

    let raised = raised_for(&state.db, &startup.id).await?;
    Ok(Json(SponsorshipOpportunity::build(startup, raised)))
}

/// One entry in the public activity feed
#[derive(Debug, Serialize)]
pub struct LatestUpdate {
    pub kind: String,
    pub startup_id: String,
    pub startup_name: String,
    pub headline: String,
    pub happened_at: String,
}

/// Recent public activity: acceptances, completed milestones, and received
/// sponsorships across the portfolio, newest first, capped at 20.
pub async fn latest_updates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LatestUpdate>>, ApiError> {
    let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
        r#"
        SELECT * FROM (
            SELECT 'startup_accepted' as kind, s.id, s.name,
                   'Accepted into the call' as headline, s.decided_at as happened_at
            FROM startups s
            WHERE s.status IN ('accepted', 'completed') AND s.decided_at IS NOT NULL

            UNION ALL

            SELECT 'milestone_completed' as kind, s.id, s.name,
                   'Milestone completed: ' || m.title as headline, m.completed_at as happened_at
            FROM milestones m
            INNER JOIN startups s ON m.startup_id = s.id
            WHERE m.status = 'completed' AND m.completed_at IS NOT NULL
              AND s.status IN ('accepted', 'completed')

            UNION ALL

            SELECT 'sponsorship_received' as kind, s.id, s.name,
                   'New sponsorship received' as headline, sp.created_at as happened_at
            FROM sponsorships sp
            INNER JOIN startups s ON sp.startup_id = s.id
            WHERE s.status IN ('accepted', 'completed')
        )
        ORDER BY happened_at DESC
        LIMIT 20
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let updates = rows
        .into_iter()
        .map(
            |(kind, startup_id, startup_name, headline, happened_at)| LatestUpdate {
                kind,
                startup_id,
                startup_name,
                headline,
                happened_at,
            },
        )
        .collect();

    Ok(Json(updates))
}
