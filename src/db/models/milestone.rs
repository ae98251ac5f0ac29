//! Milestone models and the milestone status cycle.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    Pending,
    InProgress,
    Completed,
    Delayed,
}

impl MilestoneStatus {
    /// Next step when cycling a milestone forward. A delayed milestone
    /// resumes work rather than jumping straight to completed.
    pub fn advanced(&self) -> Option<MilestoneStatus> {
        match self {
            MilestoneStatus::Pending => Some(MilestoneStatus::InProgress),
            MilestoneStatus::InProgress => Some(MilestoneStatus::Completed),
            MilestoneStatus::Delayed => Some(MilestoneStatus::InProgress),
            MilestoneStatus::Completed => None,
        }
    }
}

impl std::fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MilestoneStatus::Pending => "pending",
            MilestoneStatus::InProgress => "in_progress",
            MilestoneStatus::Completed => "completed",
            MilestoneStatus::Delayed => "delayed",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for MilestoneStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(MilestoneStatus::Pending),
            "in_progress" => Ok(MilestoneStatus::InProgress),
            "completed" => Ok(MilestoneStatus::Completed),
            "delayed" => Ok(MilestoneStatus::Delayed),
            _ => Err(format!("Unknown milestone status: {}", s)),
        }
    }
}

impl From<String> for MilestoneStatus {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(MilestoneStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Milestone {
    pub id: String,
    pub startup_id: String,
    pub title: String,
    pub description: String,
    pub due_date: Option<String>,
    pub status: String,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Milestone {
    pub fn status_enum(&self) -> MilestoneStatus {
        MilestoneStatus::from(self.status.clone())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMilestoneRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMilestoneRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<String>,
}

/// Completion progress shown on the overview panel
#[derive(Debug, Serialize)]
pub struct MilestoneProgress {
    pub total: i64,
    pub completed: i64,
    /// 0-100, zero when there are no milestones
    pub percent: i64,
}

impl MilestoneProgress {
    pub fn new(total: i64, completed: i64) -> Self {
        let percent = if total > 0 {
            (completed * 100) / total
        } else {
            0
        };
        Self {
            total,
            completed,
            percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_cycle() {
        assert_eq!(
            MilestoneStatus::Pending.advanced(),
            Some(MilestoneStatus::InProgress)
        );
        assert_eq!(
            MilestoneStatus::InProgress.advanced(),
            Some(MilestoneStatus::Completed)
        );
        assert_eq!(
            MilestoneStatus::Delayed.advanced(),
            Some(MilestoneStatus::InProgress)
        );
        assert_eq!(MilestoneStatus::Completed.advanced(), None);
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(MilestoneProgress::new(0, 0).percent, 0);
        assert_eq!(MilestoneProgress::new(4, 1).percent, 25);
        assert_eq!(MilestoneProgress::new(3, 3).percent, 100);
    }
}
