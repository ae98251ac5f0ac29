//! Review models: one scored review per reviewer per startup.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Review entity. Sub-scores are 1-10.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: String,
    pub startup_id: String,
    pub reviewer_id: String,
    pub team_score: i64,
    pub product_score: i64,
    pub market_score: i64,
    pub feedback: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Review {
    /// Mean of the three sub-scores
    pub fn overall_score(&self) -> f64 {
        (self.team_score + self.product_score + self.market_score) as f64 / 3.0
    }
}

/// Review with reviewer details for list views
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReviewWithReviewer {
    pub id: String,
    pub startup_id: String,
    pub reviewer_id: String,
    pub team_score: i64,
    pub product_score: i64,
    pub market_score: i64,
    pub feedback: String,
    pub created_at: String,
    pub updated_at: String,
    pub reviewer_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub team_score: i64,
    pub product_score: i64,
    pub market_score: i64,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub team_score: Option<i64>,
    pub product_score: Option<i64>,
    pub market_score: Option<i64>,
    pub feedback: Option<String>,
}

/// Aggregate shown alongside the review list
#[derive(Debug, Serialize)]
pub struct ReviewSummary {
    pub review_count: i64,
    /// Mean of the per-review overall scores, None with no reviews
    pub average_score: Option<f64>,
}

impl ReviewSummary {
    pub fn from_reviews(reviews: &[ReviewWithReviewer]) -> Self {
        if reviews.is_empty() {
            return Self {
                review_count: 0,
                average_score: None,
            };
        }
        let total: f64 = reviews
            .iter()
            .map(|r| (r.team_score + r.product_score + r.market_score) as f64 / 3.0)
            .sum();
        Self {
            review_count: reviews.len() as i64,
            average_score: Some(total / reviews.len() as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(team: i64, product: i64, market: i64) -> ReviewWithReviewer {
        ReviewWithReviewer {
            id: "r".into(),
            startup_id: "s".into(),
            reviewer_id: "u".into(),
            team_score: team,
            product_score: product,
            market_score: market,
            feedback: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
            reviewer_name: "Rev".into(),
        }
    }

    #[test]
    fn test_overall_score_is_mean() {
        let r = Review {
            id: "r".into(),
            startup_id: "s".into(),
            reviewer_id: "u".into(),
            team_score: 6,
            product_score: 9,
            market_score: 9,
            feedback: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert!((r.overall_score() - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_empty() {
        let summary = ReviewSummary::from_reviews(&[]);
        assert_eq!(summary.review_count, 0);
        assert!(summary.average_score.is_none());
    }

    #[test]
    fn test_summary_average() {
        let reviews = vec![review(6, 6, 6), review(9, 9, 9)];
        let summary = ReviewSummary::from_reviews(&reviews);
        assert_eq!(summary.review_count, 2);
        assert!((summary.average_score.unwrap() - 7.5).abs() < f64::EPSILON);
    }
}
