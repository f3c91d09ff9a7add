//! In-memory board state for a drag gesture.
//!
//! The reconciler owns the working collection of tasks and mutates it
//! optimistically while a drag is in flight. Persistence happens outside:
//! `drag_end` reports the `{status, order}` pair the store should receive.

use ordered_float::OrderedFloat;
use uuid::Uuid;

use crate::domain::task::Task;
use crate::ordering;

/// What the pointer is currently over.
#[derive(Debug, Clone, PartialEq)]
pub enum DragTarget {
    Task(Uuid),
    /// A bare column, identified by its section title.
    Column(String),
}

#[derive(Debug, Clone, PartialEq)]
enum DragState {
    Idle,
    Dragging { task_id: Uuid },
}

/// Result of a completed drop, to be persisted by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct DropOutcome {
    pub task_id: Uuid,
    pub status: String,
    pub order: f64,
    /// Set when the destination neighbor gap collapsed below the epsilon and
    /// the column needs fresh keys.
    pub needs_renormalize: bool,
}

#[derive(Debug, Clone)]
pub struct TaskBoard {
    tasks: Vec<Task>,
    drag: DragState,
}

impl TaskBoard {
    /// Builds the working collection in display order: fractional key
    /// ascending, newest first among equals (the fetch ordering).
    pub fn new(mut tasks: Vec<Task>) -> Self {
        tasks.sort_by(|a, b| {
            OrderedFloat(a.sort_order)
                .cmp(&OrderedFloat(b.sort_order))
                .then(b.created_at.cmp(&a.created_at))
        });
        Self {
            tasks,
            drag: DragState::Idle,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Tasks of one column, in working order.
    pub fn column(&self, status: &str) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.status == status).collect()
    }

    pub fn insert_top(&mut self, task: Task) {
        self.tasks.insert(0, task);
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(index))
    }

    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        *self = TaskBoard::new(tasks);
    }

    // --- Drag gesture ---

    pub fn drag_start(&mut self, task_id: Uuid) {
        if self.task(task_id).is_some() {
            self.drag = DragState::Dragging { task_id };
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Hover update. Crossing into another column reassigns the working
    /// status and repositions at the hovered slot; hovering within the same
    /// column repositions only. No persistence here.
    pub fn drag_over(&mut self, target: &DragTarget) {
        let DragState::Dragging { task_id } = self.drag else {
            return;
        };
        let Some(active_index) = self.tasks.iter().position(|t| t.id == task_id) else {
            return;
        };

        let (over_column, insert_index) = match target {
            DragTarget::Task(over_id) => {
                if *over_id == task_id {
                    return;
                }
                let Some(over_index) = self.tasks.iter().position(|t| t.id == *over_id) else {
                    return;
                };
                (self.tasks[over_index].status.clone(), over_index)
            }
            DragTarget::Column(title) => (title.clone(), self.tasks.len()),
        };

        self.tasks[active_index].status = over_column;
        move_item(&mut self.tasks, active_index, insert_index);
    }

    /// Drop. Resolves the final slot, computes the destination-column
    /// neighbors post-move and the fractional key between them. Dropping
    /// outside any target cancels without touching state.
    pub fn drag_end(&mut self, target: Option<&DragTarget>) -> Option<DropOutcome> {
        let DragState::Dragging { task_id } = self.drag else {
            return None;
        };
        self.drag = DragState::Idle;
        let target = target?;

        self.drag_over_final(task_id, target);

        let status = self.task(task_id)?.status.clone();
        let column = self.column(&status);
        let index_in_column = column.iter().position(|t| t.id == task_id)?;
        let prev = (index_in_column > 0).then(|| column[index_in_column - 1].sort_order);
        let next = column.get(index_in_column + 1).map(|t| t.sort_order);

        let order = ordering::compute_order(prev, next);
        let needs_renormalize =
            ordering::gap_collapsed(prev, Some(order)) || ordering::gap_collapsed(Some(order), next);

        if let Some(task) = self.task_mut(task_id) {
            task.sort_order = order;
        }

        Some(DropOutcome {
            task_id,
            status,
            order,
            needs_renormalize,
        })
    }

    pub fn drag_cancel(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Reassigns `0, 1000, 2000, …` across one column, returning the
    /// `(task, key)` pairs the store must be told about.
    pub fn renormalize_column(&mut self, status: &str) -> Vec<(Uuid, f64)> {
        let ids: Vec<Uuid> = self
            .tasks
            .iter()
            .filter(|t| t.status == status)
            .map(|t| t.id)
            .collect();
        let keys = ordering::renormalize(ids.len());
        let pairs: Vec<(Uuid, f64)> = ids.into_iter().zip(keys).collect();
        for (id, key) in &pairs {
            if let Some(task) = self.task_mut(*id) {
                task.sort_order = *key;
            }
        }
        pairs
    }

    // Final repositioning at drop time, same rules as a hover.
    fn drag_over_final(&mut self, task_id: Uuid, target: &DragTarget) {
        let saved = self.drag.clone();
        self.drag = DragState::Dragging { task_id };
        self.drag_over(target);
        self.drag = saved;
    }
}

fn move_item(tasks: &mut Vec<Task>, from: usize, to: usize) {
    if from == to || from >= tasks.len() {
        return;
    }
    let task = tasks.remove(from);
    let to = to.min(tasks.len());
    tasks.insert(to, task);
}
