use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which board a section belongs to. The task board and the planner board
/// share the same section mechanics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BoardKind {
    Task,
    Plan,
}

impl BoardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardKind::Task => "task",
            BoardKind::Plan => "plan",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "task" => Ok(BoardKind::Task),
            "plan" => Ok(BoardKind::Plan),
            other => Err(anyhow::anyhow!("invalid board kind: {}", other)),
        }
    }
}

/// A board column. The title doubles as the literal status value tasks and
/// plans carry, so renames and deletes must respect active references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub id: Uuid,
    pub title: String,
    pub position: i64,
    pub board: BoardKind,
    pub created_at: DateTime<Utc>,
}

impl Section {
    pub fn new(title: impl Into<String>, position: i64, board: BoardKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            position,
            board,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_kind_round_trip() {
        assert_eq!(BoardKind::parse("task").unwrap(), BoardKind::Task);
        assert_eq!(BoardKind::parse("plan").unwrap(), BoardKind::Plan);
        assert!(BoardKind::parse("notes").is_err());
    }

    #[test]
    fn test_new_section() {
        let section = Section::new("Today", 1, BoardKind::Task);
        assert_eq!(section.title, "Today");
        assert_eq!(section.position, 1);
        assert_eq!(section.board, BoardKind::Task);
    }
}
