use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A project-level grouping of tasks with its own lifecycle status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
}

/// Closed lifecycle. The store keeps a free-form string, so parsing keeps
/// unrecognized values intact instead of failing the whole fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PlanStatus {
    NotStarted,
    GoingOn,
    Stuck,
    Completed,
    Archived,
    Unknown(String),
}

impl PlanStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "Not Started" => PlanStatus::NotStarted,
            "Going On" => PlanStatus::GoingOn,
            "Stuck" => PlanStatus::Stuck,
            "Completed" => PlanStatus::Completed,
            "Archived" => PlanStatus::Archived,
            other => PlanStatus::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PlanStatus::NotStarted => "Not Started",
            PlanStatus::GoingOn => "Going On",
            PlanStatus::Stuck => "Stuck",
            PlanStatus::Completed => "Completed",
            PlanStatus::Archived => "Archived",
            PlanStatus::Unknown(s) => s,
        }
    }

    /// Archived plans are hidden from the active board.
    pub fn is_active(&self) -> bool {
        !matches!(self, PlanStatus::Archived)
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Plan {
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description,
            status: PlanStatus::NotStarted,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_plan() {
        let plan = Plan::new("Q4 Marketing", Some("Launch plan".into()));
        assert_eq!(plan.title, "Q4 Marketing");
        assert_eq!(plan.status, PlanStatus::NotStarted);
        assert!(plan.status.is_active());
    }

    #[test]
    fn test_status_round_trip() {
        for s in ["Not Started", "Going On", "Stuck", "Completed", "Archived"] {
            assert_eq!(PlanStatus::parse(s).as_str(), s);
        }
    }

    #[test]
    fn test_unknown_status_preserved() {
        let status = PlanStatus::parse("On Hold");
        assert_eq!(status, PlanStatus::Unknown("On Hold".into()));
        assert_eq!(status.as_str(), "On Hold");
        assert!(status.is_active());
    }

    #[test]
    fn test_archived_is_terminal_and_inactive() {
        assert!(!PlanStatus::Archived.is_active());
    }
}
