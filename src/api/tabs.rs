//! The tab surface of a startup: visibility listing and content dispatch.
//!
//! `GET .../tabs` returns the tab set the caller may see; `GET
//! .../tabs/:tab` resolves the requested tab against that set (falling back
//! to the first visible tab, never a 404) and returns the matching panel
//! payload.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::{FinancialSummary, MilestoneProgress, ReviewSummary, Startup, User};
use crate::workflow::{resolve_tab, visible_tabs, Tab, TAB_TABLE};
use crate::AppState;

use super::error::ApiError;
use super::startups::{financial_summary, load_startup, seed_counts};
use super::{comments, documents, financials, milestones, reviews, tasks, team};

#[derive(Debug, Serialize)]
pub struct TabInfo {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct TabListResponse {
    pub tabs: Vec<TabInfo>,
    /// First visible tab; clients select it when their current tab is gone
    pub default_tab: String,
}

#[derive(Debug, Serialize)]
pub struct TabContentResponse {
    pub tab: String,
    pub label: String,
    pub payload: serde_json::Value,
}

fn label_for(tab: Tab) -> &'static str {
    TAB_TABLE
        .iter()
        .find(|spec| spec.tab == tab)
        .map(|spec| spec.label)
        .unwrap_or("Overview")
}

/// List the tabs visible to the caller for this startup
pub async fn list_tabs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: User,
) -> Result<Json<TabListResponse>, ApiError> {
    let (startup, roles) = load_startup(&state.db, &user, &id).await?;

    let tabs: Vec<TabInfo> = visible_tabs(startup.status_enum(), &roles)
        .into_iter()
        .map(|tab| TabInfo {
            id: tab.as_str().to_string(),
            label: label_for(tab).to_string(),
        })
        .collect();

    let default_tab = tabs[0].id.clone();

    Ok(Json(TabListResponse { tabs, default_tab }))
}

/// Resolve a tab and return its panel payload. Unknown or invisible tab
/// identifiers resolve to the first visible tab instead of failing.
pub async fn get_tab_content(
    State(state): State<Arc<AppState>>,
    Path((id, tab)): Path<(String, String)>,
    user: User,
) -> Result<Json<TabContentResponse>, ApiError> {
    let (startup, roles) = load_startup(&state.db, &user, &id).await?;

    let requested = Tab::from_str(&tab).ok();
    let resolved = resolve_tab(requested, startup.status_enum(), &roles);

    let payload = build_payload(&state, &startup, resolved).await?;

    Ok(Json(TabContentResponse {
        tab: resolved.as_str().to_string(),
        label: label_for(resolved).to_string(),
        payload,
    }))
}

#[derive(Debug, Serialize)]
struct OverviewPayload<'a> {
    startup: &'a Startup,
    founder_name: String,
    milestone_progress: MilestoneProgress,
    review_summary: ReviewSummary,
    financials: FinancialSummary,
}

async fn build_payload(
    state: &AppState,
    startup: &Startup,
    tab: Tab,
) -> Result<serde_json::Value, ApiError> {
    let value = match tab {
        Tab::Overview => {
            let founder_name: Option<(String,)> =
                sqlx::query_as("SELECT name FROM users WHERE id = ?")
                    .bind(&startup.founder_id)
                    .fetch_optional(&state.db)
                    .await?;
            let counts = seed_counts(&state.db, &startup.id).await?;
            let review_items = reviews::list_for_startup(&state.db, &startup.id).await?;

            serde_json::to_value(OverviewPayload {
                startup,
                founder_name: founder_name.map(|(n,)| n).unwrap_or_default(),
                milestone_progress: MilestoneProgress::new(
                    counts.milestone_count,
                    counts.milestones_completed,
                ),
                review_summary: ReviewSummary::from_reviews(&review_items),
                financials: financial_summary(&state.db, &startup.id).await?,
            })
            .map_err(|_| ApiError::internal("Failed to encode tab payload"))?
        }
        Tab::Reviews => {
            let items = reviews::list_for_startup(&state.db, &startup.id).await?;
            let summary = ReviewSummary::from_reviews(&items);
            serde_json::json!({ "items": items, "summary": summary })
        }
        Tab::Milestones => {
            let items = milestones::list_for_startup(&state.db, &startup.id).await?;
            let progress = milestones::progress(&items);
            serde_json::json!({ "items": items, "progress": progress })
        }
        Tab::Tasks => {
            let items = tasks::list_sorted(&state.db, &startup.id).await?;
            serde_json::json!({ "items": items })
        }
        Tab::Financials => {
            let sponsorships = financials::list_sponsorships_for(&state.db, &startup.id).await?;
            let expenses = financials::list_expenses_for(&state.db, &startup.id).await?;
            let summary = FinancialSummary::from_rows(&sponsorships, &expenses);
            serde_json::json!({
                "sponsorships": sponsorships,
                "expenses": expenses,
                "summary": summary,
            })
        }
        Tab::Team => {
            let items = team::list_for_startup(&state.db, &startup.id).await?;
            serde_json::json!({ "items": items })
        }
        Tab::Documents => {
            let items = documents::list_for_startup(&state.db, &startup.id).await?;
            serde_json::json!({ "items": items })
        }
        Tab::Discussion => {
            let threads = comments::list_threads_for(&state.db, &startup.id).await?;
            serde_json::json!({ "threads": threads })
        }
    };

    Ok(value)
}
