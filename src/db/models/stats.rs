//! Dashboard statistics over the whole call.

use serde::Serialize;
use sqlx::SqlitePool;

/// Startup counts broken down by lifecycle status
#[derive(Debug, Clone, Serialize, Default)]
pub struct StatusBreakdown {
    pub draft: i64,
    pub submitted: i64,
    pub under_review: i64,
    pub accepted: i64,
    pub rejected: i64,
    pub completed: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_startups: i64,
    pub by_status: StatusBreakdown,
    pub total_reviews: i64,
    /// Integer cents across all sponsorships
    pub total_sponsored: i64,
    /// Integer cents across all expenses
    pub total_expenses: i64,
    pub sponsor_count: i64,
    pub reviewer_count: i64,
    pub founder_count: i64,
}

impl DashboardStats {
    pub async fn get(db: &SqlitePool) -> Result<Self, sqlx::Error> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM startups GROUP BY status")
                .fetch_all(db)
                .await?;

        let mut by_status = StatusBreakdown::default();
        let mut total_startups = 0;
        for (status, count) in rows {
            total_startups += count;
            match status.as_str() {
                "draft" => by_status.draft = count,
                "submitted" => by_status.submitted = count,
                "under_review" => by_status.under_review = count,
                "accepted" => by_status.accepted = count,
                "rejected" => by_status.rejected = count,
                "completed" => by_status.completed = count,
                _ => {}
            }
        }

        let total_reviews: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews")
            .fetch_one(db)
            .await?;

        let total_sponsored: (Option<i64>,) =
            sqlx::query_as("SELECT SUM(amount) FROM sponsorships")
                .fetch_one(db)
                .await?;

        let total_expenses: (Option<i64>,) = sqlx::query_as("SELECT SUM(amount) FROM expenses")
            .fetch_one(db)
            .await?;

        let role_counts: Vec<(String, i64)> =
            sqlx::query_as("SELECT role, COUNT(*) FROM users GROUP BY role")
                .fetch_all(db)
                .await?;

        let mut sponsor_count = 0;
        let mut reviewer_count = 0;
        let mut founder_count = 0;
        for (role, count) in role_counts {
            match role.as_str() {
                "sponsor" => sponsor_count = count,
                "reviewer" => reviewer_count = count,
                "founder" => founder_count = count,
                _ => {}
            }
        }

        Ok(Self {
            total_startups,
            by_status,
            total_reviews: total_reviews.0,
            total_sponsored: total_sponsored.0.unwrap_or(0),
            total_expenses: total_expenses.0.unwrap_or(0),
            sponsor_count,
            reviewer_count,
            founder_count,
        })
    }
}
