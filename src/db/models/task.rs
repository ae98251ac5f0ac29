//! Task models and the canonical task ordering.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(format!("Unknown task status: {}", s)),
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(TaskStatus::Todo)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

impl TaskPriority {
    /// Sort rank: high sorts before medium before low
    pub fn rank(&self) -> u8 {
        match self {
            TaskPriority::High => 0,
            TaskPriority::Medium => 1,
            TaskPriority::Low => 2,
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(TaskPriority::High),
            "medium" => Ok(TaskPriority::Medium),
            "low" => Ok(TaskPriority::Low),
            _ => Err(format!("Unknown task priority: {}", s)),
        }
    }
}

impl From<String> for TaskPriority {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(TaskPriority::Medium)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: String,
    pub startup_id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub assignee_id: Option<String>,
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    pub fn status_enum(&self) -> TaskStatus {
        TaskStatus::from(self.status.clone())
    }

    pub fn priority_enum(&self) -> TaskPriority {
        TaskPriority::from(self.priority.clone())
    }
}

/// Sort tasks in place into the canonical list order: incomplete before
/// done, then priority (high first), then ascending due date with undated
/// tasks last, then created_at as a stable final tie-break.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.status_enum()
            .is_done()
            .cmp(&b.status_enum().is_done())
            .then_with(|| a.priority_enum().rank().cmp(&b.priority_enum().rank()))
            .then_with(|| match (&a.due_date, &b.due_date) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Option<String>,
    pub assignee_id: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee_id: Option<String>,
    pub due_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, status: &str, priority: &str, due: Option<&str>, created: &str) -> Task {
        Task {
            id: id.into(),
            startup_id: "s".into(),
            title: id.into(),
            description: String::new(),
            status: status.into(),
            priority: priority.into(),
            assignee_id: None,
            due_date: due.map(|d| d.to_string()),
            created_at: created.into(),
            updated_at: created.into(),
        }
    }

    fn order(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_done_tasks_sort_last() {
        let mut tasks = vec![
            task("a", "done", "high", None, "1"),
            task("b", "todo", "low", None, "2"),
        ];
        sort_tasks(&mut tasks);
        assert_eq!(order(&tasks), vec!["b", "a"]);
    }

    #[test]
    fn test_priority_within_group() {
        let mut tasks = vec![
            task("low", "todo", "low", None, "1"),
            task("high", "todo", "high", None, "2"),
            task("med", "todo", "medium", None, "3"),
        ];
        sort_tasks(&mut tasks);
        assert_eq!(order(&tasks), vec!["high", "med", "low"]);
    }

    #[test]
    fn test_due_date_breaks_priority_ties() {
        let mut tasks = vec![
            task("later", "todo", "high", Some("2026-09-01"), "1"),
            task("none", "todo", "high", None, "2"),
            task("soon", "todo", "high", Some("2026-08-15"), "3"),
        ];
        sort_tasks(&mut tasks);
        assert_eq!(order(&tasks), vec!["soon", "later", "none"]);
    }

    #[test]
    fn test_in_progress_counts_as_incomplete() {
        let mut tasks = vec![
            task("done", "done", "high", None, "1"),
            task("wip", "in_progress", "low", None, "2"),
        ];
        sort_tasks(&mut tasks);
        assert_eq!(order(&tasks), vec!["wip", "done"]);
    }

    #[test]
    fn test_full_ordering_is_stable_and_total() {
        let mut tasks = vec![
            task("d-high", "done", "high", Some("2026-01-01"), "1"),
            task("t-med-early", "todo", "medium", Some("2026-02-01"), "2"),
            task("t-med-late", "todo", "medium", Some("2026-03-01"), "3"),
            task("t-high", "todo", "high", None, "4"),
            task("d-low", "done", "low", None, "5"),
            task("t-med-undated", "todo", "medium", None, "6"),
        ];
        sort_tasks(&mut tasks);
        assert_eq!(
            order(&tasks),
            vec![
                "t-high",
                "t-med-early",
                "t-med-late",
                "t-med-undated",
                "d-high",
                "d-low"
            ]
        );
    }
}
