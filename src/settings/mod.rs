//! Draft-buffered section editing: every change stays in memory until an
//! explicit save, and navigation away from dirty drafts is gated.

pub mod draft;

pub use draft::{DraftEntry, DraftRegistry, SaveBatch, SectionDraft};
