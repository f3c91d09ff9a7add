use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::section::{BoardKind, Section};
use crate::domain::tag::{Tag, TagColor};
use crate::repository::Repository;
use crate::settings::draft::SectionDraft;

const LAST_ACTIVE_VIEW: &str = "last_active_view";

/// Settings operations: section drafts, tag management, dated cleanup, and
/// persisted UI state.
pub struct SettingsService {
    repo: Repository,
}

impl SettingsService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn load_draft(&self, board: BoardKind) -> Result<SectionDraft> {
        let sections = self.repo.sections.list(board).await?;
        Ok(SectionDraft::new(board, sections))
    }

    /// Live rows still carrying this section title as their status. The
    /// draft's remove guard takes this count.
    pub async fn active_references(&self, board: BoardKind, title: &str) -> Result<i64> {
        match board {
            BoardKind::Task => self.repo.tasks.count_active_by_status(title).await,
            BoardKind::Plan => self.repo.plans.count_active_by_status(title).await,
        }
    }

    /// Guarded draft removal: the reference count comes from the store at
    /// the moment of the click.
    pub async fn remove_section(&self, draft: &mut SectionDraft, id: Uuid) -> Result<()> {
        let Some(entry) = draft.entries().iter().find(|e| e.id == id) else {
            return Ok(());
        };
        let count = self.active_references(draft.board(), &entry.title).await?;
        draft.remove(id, count)?;
        Ok(())
    }

    /// Executes the draft's save batch (deletes, then upserts, then inserts)
    /// and reloads the draft from the refetched canonical rows. The delete
    /// guard is re-checked against the store, since references may have
    /// appeared since the row left the working list.
    pub async fn save(&self, draft: &mut SectionDraft) -> Result<Vec<Section>> {
        let board = draft.board();

        for (id, title) in draft.deleted_titles() {
            let count = self.active_references(board, &title).await?;
            if count > 0 {
                return Err(DomainError::SectionInUse { title, count }.into());
            }
            self.repo.sections.delete(id).await?;
        }

        let batch = draft.commit_plan();
        let existing = self.repo.sections.list(board).await?;
        for (id, title, position) in batch.upserts {
            let Some(mut section) = existing.iter().find(|s| s.id == id).cloned() else {
                continue;
            };
            section.title = title;
            section.position = position;
            self.repo.sections.update(&section).await?;
        }
        for (title, position) in batch.inserts {
            self.repo
                .sections
                .create(&Section::new(title, position, board))
                .await?;
        }

        let sections = self.repo.sections.list(board).await?;
        draft.reload(sections.clone());
        info!(board = board.as_str(), sections = sections.len(), "sections saved");
        Ok(sections)
    }

    // --- Tags ---

    pub async fn create_tag(&self, name: impl Into<String>, color: TagColor) -> Result<Tag> {
        let tag = Tag::new(name, color);
        validate_tag(&tag)?;
        self.repo.tags.create(&tag).await?;
        Ok(tag)
    }

    pub async fn rename_tag(&self, id: Uuid, name: impl Into<String>) -> Result<()> {
        let tags = self.repo.tags.list_all().await?;
        let Some(mut tag) = tags.into_iter().find(|t| t.id == id) else {
            anyhow::bail!("tag {} not found", id);
        };
        tag.name = name.into();
        validate_tag(&tag)?;
        self.repo.tags.update(&tag).await
    }

    pub async fn delete_tag(&self, id: Uuid) -> Result<bool> {
        self.repo.tags.delete(id).await
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.repo.tags.list_all().await
    }

    // --- Data cleanup ---

    /// Permanently deletes archived tasks created before the cut-off.
    /// Returns the removed row count for the confirmation message.
    pub async fn cleanup_archived_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let deleted = self.repo.tasks.delete_archived_before(cutoff).await?;
        info!(deleted, %cutoff, "archived task cleanup");
        Ok(deleted)
    }

    // --- Persisted UI state ---

    pub async fn last_active_view(&self) -> Result<Option<String>> {
        self.repo.app_state.get(LAST_ACTIVE_VIEW).await
    }

    pub async fn set_last_active_view(&self, view: &str) -> Result<()> {
        self.repo.app_state.set(LAST_ACTIVE_VIEW, view).await
    }
}

fn validate_tag(tag: &Tag) -> Result<(), DomainError> {
    if tag.name.trim().is_empty() {
        return Err(DomainError::Validation("tag name cannot be empty".into()));
    }
    if matches!(tag.color, TagColor::Unknown(_)) {
        return Err(DomainError::Validation(format!(
            "tag color {} is not in the palette",
            tag.color.as_str()
        )));
    }
    Ok(())
}
