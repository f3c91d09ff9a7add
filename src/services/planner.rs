use anyhow::Result;
use tracing::info;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::plan::{Plan, PlanStatus};
use crate::domain::task::Task;
use crate::repository::Repository;

/// Plan lifecycle. Plans move freely among the active statuses; `Archived`
/// is reachable only through `flush`.
pub struct PlannerService {
    repo: Repository,
}

impl PlannerService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn create_plan(
        &self,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<Plan> {
        let plan = Plan::new(title, description);
        if plan.title.trim().is_empty() {
            return Err(DomainError::Validation("plan title cannot be empty".into()).into());
        }
        self.repo.plans.create(&plan).await?;
        Ok(plan)
    }

    pub async fn update_plan(&self, plan: &Plan) -> Result<()> {
        if plan.title.trim().is_empty() {
            return Err(DomainError::Validation("plan title cannot be empty".into()).into());
        }
        self.repo.plans.update(plan).await
    }

    /// Drag-to-column or dropdown transition among the active statuses.
    pub async fn set_status(&self, plan_id: Uuid, status: PlanStatus) -> Result<()> {
        if status == PlanStatus::Archived {
            return Err(DomainError::Validation(
                "plans are archived through flush, not a status change".into(),
            )
            .into());
        }
        self.repo.plans.set_status(plan_id, &status).await
    }

    pub async fn list_active(&self) -> Result<Vec<Plan>> {
        self.repo.plans.list_active().await
    }

    pub async fn plan_tasks(&self, plan_id: Uuid) -> Result<Vec<Task>> {
        self.repo.tasks.list_by_plan(plan_id).await
    }

    /// Called after a task flips to completed. When every non-archived task
    /// of its plan is now done, the plan is promoted to `Completed`, unless
    /// it already is, or has been archived.
    pub async fn on_task_completed(&self, task_id: Uuid) -> Result<Option<Plan>> {
        let Some(task) = self.repo.tasks.get(task_id).await? else {
            return Ok(None);
        };
        let Some(plan_id) = task.plan_id else {
            return Ok(None);
        };
        let siblings = self.repo.tasks.list_by_plan(plan_id).await?;
        if siblings.is_empty() || siblings.iter().any(|t| !t.completed) {
            return Ok(None);
        }

        let Some(mut plan) = self.repo.plans.get(plan_id).await? else {
            return Ok(None);
        };
        if matches!(plan.status, PlanStatus::Completed | PlanStatus::Archived) {
            return Ok(None);
        }
        plan.status = PlanStatus::Completed;
        self.repo.plans.set_status(plan_id, &plan.status).await?;
        info!(%plan_id, "all tasks done; plan promoted to Completed");
        Ok(Some(plan))
    }

    /// All-or-nothing archival of every `Completed` plan. A plan with zero
    /// tasks qualifies vacuously; a single plan holding an incomplete
    /// non-archived task blocks the whole flush. Returns the number of plans
    /// archived.
    pub async fn flush(&self) -> Result<usize> {
        let candidates: Vec<Plan> = self
            .repo
            .plans
            .list_active()
            .await?
            .into_iter()
            .filter(|p| p.status == PlanStatus::Completed)
            .collect();

        let mut blocking = 0usize;
        for plan in &candidates {
            let tasks = self.repo.tasks.list_by_plan(plan.id).await?;
            if tasks.iter().any(|t| !t.completed) {
                blocking += 1;
            }
        }
        if blocking > 0 {
            return Err(DomainError::FlushBlocked { blocking }.into());
        }

        let ids: Vec<Uuid> = candidates.iter().map(|p| p.id).collect();
        if !ids.is_empty() {
            self.repo.plans.archive_with_tasks(&ids).await?;
        }
        info!(archived = ids.len(), "flush complete");
        Ok(ids.len())
    }

    /// Permanent removal. The plan's tasks are archived and detached from it
    /// before the row is deleted, so they stay reachable through cleanup.
    pub async fn delete_plan(&self, plan_id: Uuid) -> Result<bool> {
        self.repo.plans.delete_cascade(plan_id).await
    }

    pub async fn assign_task(&self, task_id: Uuid, plan_id: Option<Uuid>) -> Result<()> {
        self.repo.tasks.set_plan(task_id, plan_id).await
    }

    /// Incomplete tasks not yet allocated to any plan.
    pub async fn list_unallocated(&self) -> Result<Vec<Task>> {
        let tasks = self.repo.tasks.list_active().await?;
        Ok(tasks
            .into_iter()
            .filter(|t| t.plan_id.is_none() && !t.completed)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::database::init_test_database;

    async fn service() -> PlannerService {
        let pool = init_test_database().await.unwrap();
        PlannerService::new(Repository::new(pool))
    }

    async fn plan_with_tasks(
        service: &PlannerService,
        title: &str,
        completed: &[bool],
    ) -> (Plan, Vec<Task>) {
        let plan = service.create_plan(title, None).await.unwrap();
        let mut tasks = Vec::new();
        for (i, &done) in completed.iter().enumerate() {
            let mut task = Task::new(format!("{title}-{i}"), "Backlogs");
            task.plan_id = Some(plan.id);
            task.completed = done;
            service.repo.tasks.create(&task).await.unwrap();
            tasks.push(task);
        }
        (plan, tasks)
    }

    #[tokio::test]
    async fn test_set_status_rejects_archived() {
        let service = service().await;
        let plan = service.create_plan("Q4", None).await.unwrap();

        assert!(service
            .set_status(plan.id, PlanStatus::GoingOn)
            .await
            .is_ok());
        assert!(service
            .set_status(plan.id, PlanStatus::Archived)
            .await
            .is_err());

        let stored = service.repo.plans.get(plan.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PlanStatus::GoingOn);
    }

    #[tokio::test]
    async fn test_auto_promotion_on_last_completion() {
        let service = service().await;
        let (plan, tasks) = plan_with_tasks(&service, "launch", &[true, false]).await;

        // One task still open: no promotion.
        assert!(service
            .on_task_completed(tasks[0].id)
            .await
            .unwrap()
            .is_none());

        service
            .repo
            .tasks
            .set_completed(tasks[1].id, true)
            .await
            .unwrap();
        let promoted = service.on_task_completed(tasks[1].id).await.unwrap();
        assert_eq!(promoted.unwrap().status, PlanStatus::Completed);

        let stored = service.repo.plans.get(plan.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PlanStatus::Completed);
    }

    #[tokio::test]
    async fn test_no_promotion_past_completed() {
        let service = service().await;
        let (plan, tasks) = plan_with_tasks(&service, "done", &[true]).await;
        service
            .repo
            .plans
            .set_status(plan.id, &PlanStatus::Completed)
            .await
            .unwrap();

        assert!(service
            .on_task_completed(tasks[0].id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_flush_is_all_or_nothing() {
        let service = service().await;
        let (ready, _) = plan_with_tasks(&service, "ready", &[true, true]).await;
        let (blocked, _) = plan_with_tasks(&service, "blocked", &[true, false]).await;
        for plan in [&ready, &blocked] {
            service
                .repo
                .plans
                .set_status(plan.id, &PlanStatus::Completed)
                .await
                .unwrap();
        }

        let err = service.flush().await.unwrap_err();
        let domain = err.downcast_ref::<DomainError>().unwrap();
        assert!(matches!(domain, DomainError::FlushBlocked { blocking: 1 }));

        // Nothing was archived, not even the qualifying plan.
        let stored = service.repo.plans.get(ready.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PlanStatus::Completed);
    }

    #[tokio::test]
    async fn test_flush_archives_plans_and_their_tasks() {
        let service = service().await;
        let (plan, tasks) = plan_with_tasks(&service, "ship", &[true, true]).await;
        let (empty, _) = plan_with_tasks(&service, "empty", &[]).await;
        for p in [&plan, &empty] {
            service
                .repo
                .plans
                .set_status(p.id, &PlanStatus::Completed)
                .await
                .unwrap();
        }

        // Zero-task plans qualify vacuously.
        assert_eq!(service.flush().await.unwrap(), 2);

        assert!(service.list_active().await.unwrap().is_empty());
        let task = service.repo.tasks.get(tasks[0].id).await.unwrap().unwrap();
        assert!(task.is_archived);
        // Flush keeps the plan link; only delete severs it.
        assert_eq!(task.plan_id, Some(plan.id));
    }

    #[tokio::test]
    async fn test_delete_plan_detaches_and_archives_tasks() {
        let service = service().await;
        let (plan, tasks) = plan_with_tasks(&service, "doomed", &[false]).await;

        assert!(service.delete_plan(plan.id).await.unwrap());
        assert!(service.repo.plans.get(plan.id).await.unwrap().is_none());

        let task = service.repo.tasks.get(tasks[0].id).await.unwrap().unwrap();
        assert!(task.is_archived);
        assert_eq!(task.plan_id, None);
    }

    #[tokio::test]
    async fn test_list_unallocated() {
        let service = service().await;
        let (_, _) = plan_with_tasks(&service, "allocated", &[false]).await;
        let loose = Task::new("loose", "Backlogs");
        let mut done = Task::new("done", "Backlogs");
        done.completed = true;
        service.repo.tasks.create(&loose).await.unwrap();
        service.repo.tasks.create(&done).await.unwrap();

        let unallocated = service.list_unallocated().await.unwrap();
        assert_eq!(unallocated.len(), 1);
        assert_eq!(unallocated[0].id, loose.id);
    }
}
