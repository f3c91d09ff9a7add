use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::section::{BoardKind, Section};

/// One row of the working list. Entries added in the draft carry a freshly
/// minted id and the `temp` marker until the save turns them into inserts.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftEntry {
    pub id: Uuid,
    pub title: String,
    pub temp: bool,
}

/// What a save must do, in order: deletes first, then updates of surviving
/// rows (position = working index), then inserts of draft-only rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveBatch {
    pub deletes: Vec<Uuid>,
    pub upserts: Vec<(Uuid, String, i64)>,
    pub inserts: Vec<(String, i64)>,
}

/// Draft state over one board's section list.
#[derive(Debug, Clone)]
pub struct SectionDraft {
    board: BoardKind,
    original: Vec<Section>,
    working: Vec<DraftEntry>,
    deleted: HashSet<Uuid>,
}

impl SectionDraft {
    pub fn new(board: BoardKind, sections: Vec<Section>) -> Self {
        let working = sections
            .iter()
            .map(|s| DraftEntry {
                id: s.id,
                title: s.title.clone(),
                temp: false,
            })
            .collect();
        Self {
            board,
            original: sections,
            working,
            deleted: HashSet::new(),
        }
    }

    pub fn board(&self) -> BoardKind {
        self.board
    }

    pub fn entries(&self) -> &[DraftEntry] {
        &self.working
    }

    /// Title of a row pending deletion, for the store-side delete guard.
    pub fn deleted_titles(&self) -> Vec<(Uuid, String)> {
        self.original
            .iter()
            .filter(|s| self.deleted.contains(&s.id))
            .map(|s| (s.id, s.title.clone()))
            .collect()
    }

    pub fn add(&mut self, title: impl Into<String>) -> Result<Uuid, DomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::Validation("section title cannot be empty".into()));
        }
        let id = Uuid::new_v4();
        self.working.push(DraftEntry {
            id,
            title,
            temp: true,
        });
        Ok(id)
    }

    pub fn rename(&mut self, id: Uuid, title: impl Into<String>) -> Result<(), DomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::Validation("section title cannot be empty".into()));
        }
        if let Some(entry) = self.working.iter_mut().find(|e| e.id == id) {
            entry.title = title;
        }
        Ok(())
    }

    /// Drag reorder within the working list.
    pub fn move_item(&mut self, from: usize, to: usize) {
        if from >= self.working.len() || from == to {
            return;
        }
        let entry = self.working.remove(from);
        let to = to.min(self.working.len());
        self.working.insert(to, entry);
    }

    /// Removal is guarded by the caller-supplied count of live rows still
    /// carrying this section's title as their status.
    pub fn remove(&mut self, id: Uuid, active_count: i64) -> Result<(), DomainError> {
        let Some(index) = self.working.iter().position(|e| e.id == id) else {
            return Ok(());
        };
        if active_count > 0 {
            return Err(DomainError::SectionInUse {
                title: self.working[index].title.clone(),
                count: active_count,
            });
        }
        let entry = self.working.remove(index);
        if !entry.temp {
            self.deleted.insert(entry.id);
        }
        Ok(())
    }

    /// Membership, order, or title differences, or pending deletes/creates.
    pub fn is_dirty(&self) -> bool {
        if !self.deleted.is_empty() {
            return true;
        }
        if self.working.len() != self.original.len() {
            return true;
        }
        self.working
            .iter()
            .zip(self.original.iter())
            .any(|(w, o)| w.temp || w.id != o.id || w.title != o.title)
    }

    pub fn commit_plan(&self) -> SaveBatch {
        let mut batch = SaveBatch {
            deletes: self.deleted.iter().copied().collect(),
            ..Default::default()
        };
        for (index, entry) in self.working.iter().enumerate() {
            let position = index as i64;
            if entry.temp {
                batch.inserts.push((entry.title.clone(), position));
            } else {
                batch.upserts.push((entry.id, entry.title.clone(), position));
            }
        }
        batch
    }

    /// Discards everything back to the snapshot.
    pub fn reset(&mut self) {
        *self = SectionDraft::new(self.board, std::mem::take(&mut self.original));
    }

    /// Replaces the snapshot after a save with the refetched canonical rows.
    pub fn reload(&mut self, sections: Vec<Section>) {
        *self = SectionDraft::new(self.board, sections);
    }
}

/// All open drafts. The global dirty flag gates navigation; confirmed
/// navigation discards every draft at once.
#[derive(Debug, Default)]
pub struct DraftRegistry {
    drafts: HashMap<BoardKind, SectionDraft>,
}

impl DraftRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, draft: SectionDraft) {
        self.drafts.insert(draft.board(), draft);
    }

    pub fn get(&self, board: BoardKind) -> Option<&SectionDraft> {
        self.drafts.get(&board)
    }

    pub fn get_mut(&mut self, board: BoardKind) -> Option<&mut SectionDraft> {
        self.drafts.get_mut(&board)
    }

    pub fn is_dirty(&self) -> bool {
        self.drafts.values().any(|d| d.is_dirty())
    }

    pub fn discard_all(&mut self) {
        for draft in self.drafts.values_mut() {
            draft.reset();
        }
    }
}
