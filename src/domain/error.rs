use thiserror::Error;

/// Errors raised before any mutation reaches the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),

    /// A section cannot be deleted while active tasks/plans still carry its
    /// title as their status.
    #[error("section \"{title}\" still has {count} active items")]
    SectionInUse { title: String, count: i64 },

    /// Flush is all-or-nothing: one blocked plan blocks the batch.
    #[error("{blocking} completed plan(s) still have unfinished tasks")]
    FlushBlocked { blocking: usize },
}
