pub mod reconciler;

pub use reconciler::{DragTarget, DropOutcome, TaskBoard};
