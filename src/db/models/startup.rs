//! Startup records and the status state machine.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::financial::FinancialSummary;

/// Lifecycle status of a startup within the call.
///
/// Transitions are monotonic: a startup never moves backward, and
/// `Rejected`/`Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupStatus {
    Draft,
    Submitted,
    UnderReview,
    Accepted,
    Rejected,
    Completed,
}

/// Attempted status change that the state machine does not allow
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("Startup is already {0}")]
    AlreadyInStatus(StartupStatus),
    #[error("Cannot move a startup from {from} to {to}")]
    Illegal {
        from: StartupStatus,
        to: StartupStatus,
    },
}

impl StartupStatus {
    pub const ALL: [StartupStatus; 6] = [
        StartupStatus::Draft,
        StartupStatus::Submitted,
        StartupStatus::UnderReview,
        StartupStatus::Accepted,
        StartupStatus::Rejected,
        StartupStatus::Completed,
    ];

    /// Check whether `next` is a legal forward step from this status
    pub fn can_transition_to(&self, next: StartupStatus) -> bool {
        matches!(
            (self, next),
            (StartupStatus::Draft, StartupStatus::Submitted)
                | (StartupStatus::Submitted, StartupStatus::UnderReview)
                | (StartupStatus::UnderReview, StartupStatus::Accepted)
                | (StartupStatus::UnderReview, StartupStatus::Rejected)
                | (StartupStatus::Accepted, StartupStatus::Completed)
        )
    }

    /// Validate a transition, distinguishing a no-op from an illegal move
    pub fn transition_to(&self, next: StartupStatus) -> Result<StartupStatus, TransitionError> {
        if *self == next {
            return Err(TransitionError::AlreadyInStatus(next));
        }
        if !self.can_transition_to(next) {
            return Err(TransitionError::Illegal {
                from: *self,
                to: next,
            });
        }
        Ok(next)
    }

    /// Whether only admins may perform this transition. Founders may
    /// submit their own draft and mark their accepted startup completed;
    /// review-phase decisions belong to admins.
    pub fn transition_requires_admin(&self, next: StartupStatus) -> bool {
        !matches!(
            (self, next),
            (StartupStatus::Draft, StartupStatus::Submitted)
                | (StartupStatus::Accepted, StartupStatus::Completed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StartupStatus::Rejected | StartupStatus::Completed)
    }

    /// Accepted or completed: the startup is part of the portfolio and its
    /// execution tabs (milestones, tasks, financials) are live.
    pub fn is_portfolio(&self) -> bool {
        matches!(self, StartupStatus::Accepted | StartupStatus::Completed)
    }
}

impl std::fmt::Display for StartupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StartupStatus::Draft => "draft",
            StartupStatus::Submitted => "submitted",
            StartupStatus::UnderReview => "under_review",
            StartupStatus::Accepted => "accepted",
            StartupStatus::Rejected => "rejected",
            StartupStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for StartupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(StartupStatus::Draft),
            "submitted" => Ok(StartupStatus::Submitted),
            "under_review" => Ok(StartupStatus::UnderReview),
            "accepted" => Ok(StartupStatus::Accepted),
            "rejected" => Ok(StartupStatus::Rejected),
            "completed" => Ok(StartupStatus::Completed),
            _ => Err(format!("Unknown startup status: {}", s)),
        }
    }
}

impl From<String> for StartupStatus {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(StartupStatus::Draft)
    }
}

/// Funding stage of a startup at submission time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingStage {
    Idea,
    PreSeed,
    Seed,
    SeriesA,
    Growth,
}

impl std::fmt::Display for FundingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FundingStage::Idea => "idea",
            FundingStage::PreSeed => "pre_seed",
            FundingStage::Seed => "seed",
            FundingStage::SeriesA => "series_a",
            FundingStage::Growth => "growth",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for FundingStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idea" => Ok(FundingStage::Idea),
            "pre_seed" => Ok(FundingStage::PreSeed),
            "seed" => Ok(FundingStage::Seed),
            "series_a" => Ok(FundingStage::SeriesA),
            "growth" => Ok(FundingStage::Growth),
            _ => Err(format!("Unknown funding stage: {}", s)),
        }
    }
}

/// Startup entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Startup {
    pub id: String,
    pub name: String,
    pub description: String,
    pub pitch: String,
    /// JSON array of strings
    pub industry_tags: String,
    pub funding_stage: String,
    /// Target raise in integer cents
    pub funding_goal: i64,
    pub status: String,
    pub founder_id: String,
    pub submitted_at: Option<String>,
    pub decided_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Startup {
    /// Get the status as a StartupStatus enum
    pub fn status_enum(&self) -> StartupStatus {
        StartupStatus::from(self.status.clone())
    }

    /// Decode the industry tags JSON column
    pub fn tags(&self) -> Vec<String> {
        serde_json::from_str(&self.industry_tags).unwrap_or_default()
    }
}

/// Request to create a startup (always starts as a draft)
#[derive(Debug, Deserialize)]
pub struct CreateStartupRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pitch: String,
    #[serde(default)]
    pub industry_tags: Vec<String>,
    pub funding_stage: String,
    #[serde(default)]
    pub funding_goal: i64,
}

/// Request to update a startup's editable fields
#[derive(Debug, Deserialize)]
pub struct UpdateStartupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub pitch: Option<String>,
    pub industry_tags: Option<Vec<String>>,
    pub funding_stage: Option<String>,
    pub funding_goal: Option<i64>,
}

/// Request to move a startup to a new status
#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: StartupStatus,
}

/// Filter/pagination query for startup listings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StartupListQuery {
    /// Filter by status (e.g., "under_review")
    pub status: Option<String>,
    /// Filter by industry tag membership
    pub industry: Option<String>,
    /// Filter by founder
    pub founder_id: Option<String>,
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<i64>,
    /// Items per page (defaults to 25, max 100)
    pub per_page: Option<i64>,
}

/// Paginated startup listing
#[derive(Debug, Serialize)]
pub struct StartupListResponse {
    pub items: Vec<Startup>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// Per-panel seed data embedded in the detail response so a client can
/// render without a fetch per tab
#[derive(Debug, Serialize)]
pub struct StartupSeedCounts {
    pub review_count: i64,
    pub milestone_count: i64,
    pub milestones_completed: i64,
    pub task_count: i64,
    pub tasks_done: i64,
    pub document_count: i64,
    pub comment_count: i64,
    pub team_member_count: i64,
}

/// Startup detail with embedded panel seed data
#[derive(Debug, Serialize)]
pub struct StartupDetail {
    #[serde(flatten)]
    pub startup: Startup,
    pub founder_name: String,
    pub counts: StartupSeedCounts,
    pub financials: FinancialSummary,
    /// Tab identifiers visible to the requesting user, in display order
    pub visible_tabs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGAL: [(StartupStatus, StartupStatus); 5] = [
        (StartupStatus::Draft, StartupStatus::Submitted),
        (StartupStatus::Submitted, StartupStatus::UnderReview),
        (StartupStatus::UnderReview, StartupStatus::Accepted),
        (StartupStatus::UnderReview, StartupStatus::Rejected),
        (StartupStatus::Accepted, StartupStatus::Completed),
    ];

    #[test]
    fn test_exactly_the_legal_transitions_are_accepted() {
        for from in StartupStatus::ALL {
            for to in StartupStatus::ALL {
                let expected = LEGAL.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_no_backward_transitions() {
        // The legal edges form a forward-only chain with one branch
        assert!(!StartupStatus::Submitted.can_transition_to(StartupStatus::Draft));
        assert!(!StartupStatus::UnderReview.can_transition_to(StartupStatus::Submitted));
        assert!(!StartupStatus::Accepted.can_transition_to(StartupStatus::UnderReview));
        assert!(!StartupStatus::Rejected.can_transition_to(StartupStatus::UnderReview));
    }

    #[test]
    fn test_terminal_statuses_have_no_exits() {
        for to in StartupStatus::ALL {
            assert!(!StartupStatus::Rejected.can_transition_to(to));
            assert!(!StartupStatus::Completed.can_transition_to(to));
        }
    }

    #[test]
    fn test_transition_to_distinguishes_noop_from_illegal() {
        match StartupStatus::Draft.transition_to(StartupStatus::Draft) {
            Err(TransitionError::AlreadyInStatus(StartupStatus::Draft)) => {}
            other => panic!("expected no-op error, got {:?}", other),
        }
        match StartupStatus::Draft.transition_to(StartupStatus::Accepted) {
            Err(TransitionError::Illegal { .. }) => {}
            other => panic!("expected illegal error, got {:?}", other),
        }
        assert_eq!(
            StartupStatus::Draft
                .transition_to(StartupStatus::Submitted)
                .unwrap(),
            StartupStatus::Submitted
        );
    }

    #[test]
    fn test_founder_transitions() {
        assert!(!StartupStatus::Draft.transition_requires_admin(StartupStatus::Submitted));
        assert!(!StartupStatus::Accepted.transition_requires_admin(StartupStatus::Completed));
        assert!(StartupStatus::Submitted.transition_requires_admin(StartupStatus::UnderReview));
        assert!(StartupStatus::UnderReview.transition_requires_admin(StartupStatus::Accepted));
        assert!(StartupStatus::UnderReview.transition_requires_admin(StartupStatus::Rejected));
    }

    #[test]
    fn test_status_round_trip() {
        for status in StartupStatus::ALL {
            assert_eq!(status.to_string().parse::<StartupStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_tags_decode() {
        let startup = Startup {
            id: "s1".into(),
            name: "Gridline".into(),
            description: String::new(),
            pitch: String::new(),
            industry_tags: r#"["energy","iot"]"#.into(),
            funding_stage: "seed".into(),
            funding_goal: 0,
            status: "draft".into(),
            founder_id: "u1".into(),
            submitted_at: None,
            decided_at: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert_eq!(startup.tags(), vec!["energy", "iot"]);
    }
}
