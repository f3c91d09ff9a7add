use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A note holding HTML content, optionally filed under a folder and/or
/// attached to a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub pinned: bool,
    pub folder_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(title: impl Into<String>, folder_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: String::new(),
            pinned: false,
            folder_id,
            plan_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Folders form a tree by construction: a folder is only ever created as a
/// child of the folder currently open.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Folder {
    pub fn new(name: impl Into<String>, parent_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            parent_id,
            created_at: Utc::now(),
        }
    }
}

/// One step in a folder's ancestor path, root first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Breadcrumb {
    pub id: Uuid,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_note() {
        let note = Note::new("Meeting minutes", None);
        assert_eq!(note.title, "Meeting minutes");
        assert!(!note.pinned);
        assert!(note.folder_id.is_none());
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn test_new_folder_child() {
        let root = Folder::new("Work", None);
        let child = Folder::new("Reports", Some(root.id));
        assert_eq!(child.parent_id, Some(root.id));
    }
}
