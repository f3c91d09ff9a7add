pub mod error;
pub mod note;
pub mod plan;
pub mod section;
pub mod tag;
pub mod task;
