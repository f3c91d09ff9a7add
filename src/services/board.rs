use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::board::{DropOutcome, TaskBoard};
use crate::domain::section::{BoardKind, Section};
use crate::domain::task::Task;
use crate::repository::Repository;
use crate::services::PlannerService;
use crate::sync::GoogleTasksClient;

const DEADLINE_TODAY: &str = "Today";
const DEADLINE_THIS_WEEK: &str = "This Week";
const DEADLINE_LATER: &str = "Later";

/// Task board operations. Mutations are optimistic: the in-memory board is
/// updated first and the store write follows; on failure the board is
/// reverted or reconciled from a fresh fetch.
pub struct BoardService {
    repo: Repository,
    planner: PlannerService,
    sync: GoogleTasksClient,
}

impl BoardService {
    pub fn new(repo: Repository, sync: GoogleTasksClient) -> Self {
        Self {
            planner: PlannerService::new(repo.clone()),
            repo,
            sync,
        }
    }

    /// Fetches the active board and runs the deadline pass: tasks with a due
    /// date land in the matching deadline section. Completed tasks stay put.
    pub async fn load(&self) -> Result<(TaskBoard, Vec<Section>)> {
        let mut tasks = self.repo.tasks.list_active().await?;
        let sections = self.repo.sections.list(BoardKind::Task).await?;

        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        for task in tasks.iter_mut() {
            let Some(target) = deadline_section(task) else {
                continue;
            };
            if task.status == target || !titles.contains(&target) {
                continue;
            }
            task.status = target.to_string();
            self.repo
                .tasks
                .set_status_and_order(task.id, target, task.sort_order)
                .await?;
        }

        Ok((TaskBoard::new(tasks), sections))
    }

    /// Validate, show immediately, persist, then swap the optimistic row for
    /// the stored one. Tag links and the Google Tasks push are best-effort.
    pub async fn create_task(
        &self,
        board: &mut TaskBoard,
        task: Task,
        tag_ids: &[Uuid],
    ) -> Result<()> {
        task.validate()?;
        let task_id = task.id;
        board.insert_top(task.clone());

        if let Err(err) = self.repo.tasks.create(&task).await {
            error!(%task_id, %err, "task insert failed; removing optimistic row");
            board.remove(task_id);
            return Err(err);
        }

        if !tag_ids.is_empty() {
            if let Err(err) = self.repo.tasks.set_tags(task_id, tag_ids).await {
                error!(%task_id, %err, "tag link failed; task kept without tags");
            }
        }

        self.sync.insert_task(&task).await;

        if let Some(stored) = self.repo.tasks.get(task_id).await? {
            board.remove(task_id);
            board.insert_top(stored);
        }
        info!(%task_id, "task created");
        Ok(())
    }

    /// Optimistic flip; on a failed write the flip is inverted and the error
    /// swallowed after logging. Returns the completed state the board shows.
    /// Flipping to completed may promote the task's plan when it was the
    /// last one open.
    pub async fn toggle_task(&self, board: &mut TaskBoard, task_id: Uuid) -> Result<bool> {
        let Some(task) = board.task_mut(task_id) else {
            anyhow::bail!("task {} not on the board", task_id);
        };
        task.completed = !task.completed;
        let completed = task.completed;
        let title = task.title.clone();

        if let Err(err) = self.repo.tasks.set_completed(task_id, completed).await {
            error!(%task_id, %err, "toggle persist failed; reverting");
            if let Some(task) = board.task_mut(task_id) {
                task.completed = !completed;
            }
            return Ok(!completed);
        }
        if completed {
            self.planner.on_task_completed(task_id).await?;
            self.sync.complete_task(&title).await;
        }
        Ok(completed)
    }

    pub async fn update_task(&self, board: &mut TaskBoard, task: Task) -> Result<()> {
        task.validate()?;
        if let Some(slot) = board.task_mut(task.id) {
            *slot = task.clone();
        }
        if let Err(err) = self.repo.tasks.update(&task).await {
            error!(task_id = %task.id, %err, "task update failed; reconciling from store");
            self.reconcile(board).await?;
            return Err(err);
        }
        Ok(())
    }

    /// Soft delete.
    pub async fn archive_task(&self, board: &mut TaskBoard, task_id: Uuid) -> Result<()> {
        let removed = board.remove(task_id);
        if let Err(err) = self.repo.tasks.set_archived(task_id, true).await {
            error!(%task_id, %err, "archive failed; reconciling from store");
            self.reconcile(board).await?;
            return Err(err);
        }
        if let Some(task) = removed {
            self.sync.delete_task(&task.title).await;
        }
        Ok(())
    }

    /// Persists a finished drag. A collapsed neighbor gap triggers the
    /// renormalization corrective for the destination column.
    pub async fn complete_drop(&self, board: &mut TaskBoard, outcome: &DropOutcome) -> Result<()> {
        if let Err(err) = self
            .repo
            .tasks
            .set_status_and_order(outcome.task_id, &outcome.status, outcome.order)
            .await
        {
            error!(task_id = %outcome.task_id, %err, "drop persist failed; reconciling from store");
            self.reconcile(board).await?;
            return Err(err);
        }

        if outcome.needs_renormalize {
            warn!(column = %outcome.status, "order keys exhausted; renormalizing column");
            for (id, key) in board.renormalize_column(&outcome.status) {
                self.repo.tasks.set_order(id, key).await?;
            }
        }
        Ok(())
    }

    /// Replaces the working collection with the store's view.
    pub async fn reconcile(&self, board: &mut TaskBoard) -> Result<()> {
        let tasks = self.repo.tasks.list_active().await?;
        board.replace_all(tasks);
        Ok(())
    }
}

/// Which deadline section a task belongs in, if any. Overdue and same-day
/// both count as today.
fn deadline_section(task: &Task) -> Option<&'static str> {
    if task.completed {
        return None;
    }
    let due = task.due_date?.date_naive();
    let today = Utc::now().date_naive();
    if due <= today {
        Some(DEADLINE_TODAY)
    } else if (due - today).num_days() <= 7 {
        Some(DEADLINE_THIS_WEEK)
    } else {
        Some(DEADLINE_LATER)
    }
}
