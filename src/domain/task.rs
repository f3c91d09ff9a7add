use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::tag::Tag;

pub const DETACHED_KEY: &str = "detached";

/// A single board task. `status` is the literal title of the section the task
/// sits in; `sort_order` is a fractional key unique enough for midpoint
/// insertion within that section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub completed: bool,
    /// Estimated duration in minutes. Validated positive when present.
    pub duration: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub sort_order: f64,
    pub parent_task_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
    pub metadata: HashMap<String, Value>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    /// Filled from the join table at read time; order-irrelevant.
    pub tags: Vec<Tag>,
}

impl Task {
    pub fn new(title: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            status: status.into(),
            completed: false,
            duration: None,
            due_date: None,
            sort_order: Utc::now().timestamp() as f64,
            parent_task_id: None,
            plan_id: None,
            metadata: HashMap::new(),
            is_archived: false,
            created_at: Utc::now(),
            tags: Vec::new(),
        }
    }

    /// Root tasks are detached (invisible plan edge) unless the metadata flag
    /// was explicitly set to `false`.
    pub fn is_detached(&self) -> bool {
        !matches!(self.metadata.get(DETACHED_KEY), Some(Value::Bool(false)))
    }

    pub fn set_detached(&mut self, detached: bool) {
        self.metadata
            .insert(DETACHED_KEY.to_string(), Value::Bool(detached));
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::Validation("title cannot be empty".into()));
        }
        if let Some(minutes) = self.duration {
            if minutes <= 0 {
                return Err(DomainError::Validation(
                    "duration must be a positive number of minutes".into(),
                ));
            }
        }
        Ok(())
    }
}
