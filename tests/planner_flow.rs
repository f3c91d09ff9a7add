//! Plan lifecycle end to end: creation, completion-driven promotion, the
//! flush gate, and the mind-map view of the same data.

use dayboard::domain::error::DomainError;
use dayboard::domain::plan::PlanStatus;
use dayboard::domain::task::Task;
use dayboard::mindmap::{EdgeKind, MapEndpoint};
use dayboard::repository::{database, Repository};
use dayboard::services::{MindMapService, PlannerService, TreeEvent};

async fn setup() -> (PlannerService, MindMapService, Repository) {
    let pool = database::init_test_database().await.expect("test db");
    let repo = Repository::new(pool);
    (
        PlannerService::new(repo.clone()),
        MindMapService::new(repo.clone()),
        repo,
    )
}

#[tokio::test]
async fn test_plan_lifecycle_to_flush() {
    let (planner, _, repo) = setup().await;

    let plan = planner
        .create_plan("Release 1.0", Some("ship the thing".into()))
        .await
        .expect("create plan");
    assert_eq!(plan.status, PlanStatus::NotStarted);

    let mut task = Task::new("cut branch", "Today");
    task.plan_id = Some(plan.id);
    repo.tasks.create(&task).await.expect("create task");
    planner
        .set_status(plan.id, PlanStatus::GoingOn)
        .await
        .expect("start");

    // Flushing now does nothing: the plan is not Completed yet.
    assert_eq!(planner.flush().await.expect("flush"), 0);
    assert_eq!(planner.list_active().await.expect("list").len(), 1);

    // Completing the only task promotes the plan.
    repo.tasks
        .set_completed(task.id, true)
        .await
        .expect("complete");
    let promoted = planner
        .on_task_completed(task.id)
        .await
        .expect("promotion check")
        .expect("promoted");
    assert_eq!(promoted.status, PlanStatus::Completed);

    assert_eq!(planner.flush().await.expect("flush"), 1);
    assert!(planner.list_active().await.expect("list").is_empty());

    // Archived task still points at its plan.
    let archived = repo.tasks.get(task.id).await.expect("get").expect("row");
    assert!(archived.is_archived);
    assert_eq!(archived.plan_id, Some(plan.id));
}

#[tokio::test]
async fn test_one_blocked_plan_blocks_every_flush_candidate() {
    let (planner, _, repo) = setup().await;

    let clean = planner.create_plan("clean", None).await.expect("plan");
    let blocked = planner.create_plan("blocked", None).await.expect("plan");
    let mut open = Task::new("unfinished", "Today");
    open.plan_id = Some(blocked.id);
    repo.tasks.create(&open).await.expect("task");

    for plan in [&clean, &blocked] {
        repo.plans
            .set_status(plan.id, &PlanStatus::Completed)
            .await
            .expect("mark completed");
    }

    let err = planner.flush().await.expect_err("flush must block");
    let domain = err.downcast_ref::<DomainError>().expect("domain error");
    assert_eq!(*domain, DomainError::FlushBlocked { blocking: 1 });

    // All-or-nothing: the clean plan was not archived either.
    assert_eq!(planner.list_active().await.expect("list").len(), 2);

    // Finishing the straggler unblocks the whole batch.
    repo.tasks
        .set_completed(open.id, true)
        .await
        .expect("complete");
    assert_eq!(planner.flush().await.expect("flush"), 2);
    assert!(planner.list_active().await.expect("list").is_empty());
}

#[tokio::test]
async fn test_mindmap_reflects_assignments_and_edges() {
    let (planner, map, repo) = setup().await;

    let plan = planner.create_plan("Research", None).await.expect("plan");
    let loose = Task::new("collect papers", "Backlogs");
    repo.tasks.create(&loose).await.expect("task");

    // Unallocated until assigned; assignment arrives detached.
    assert_eq!(planner.list_unallocated().await.expect("list").len(), 1);
    planner
        .assign_task(loose.id, Some(plan.id))
        .await
        .expect("assign");
    assert!(planner.list_unallocated().await.expect("list").is_empty());

    let snapshot = map.snapshot(plan.id).await.expect("snapshot");
    assert_eq!(snapshot.graph.nodes.len(), 2);
    assert_eq!(snapshot.graph.edges[0].kind, EdgeKind::Detached);

    // Drawing the hub edge makes it visible; a child task nests under it.
    let mut events = map.subscribe();
    map.connect(plan.id, MapEndpoint::Plan, loose.id)
        .await
        .expect("connect");
    let snapshot = map
        .add_child(plan.id, MapEndpoint::Task(loose.id), "read abstracts")
        .await
        .expect("add child");
    assert_eq!(snapshot.graph.nodes.len(), 3);
    assert_eq!(snapshot.graph.visible_edges().count(), 2);

    assert_eq!(
        events.recv().await.expect("event"),
        TreeEvent::Refreshed { plan_id: plan.id }
    );

    // Positions persist for untouched nodes across refreshes.
    let plan_pos = snapshot.positions[&plan.id];
    let again = map.snapshot(plan.id).await.expect("snapshot");
    assert_eq!(again.positions[&plan.id], plan_pos);
}

#[tokio::test]
async fn test_delete_plan_detaches_tasks_for_cleanup() {
    let (planner, _, repo) = setup().await;

    let plan = planner.create_plan("abandoned", None).await.expect("plan");
    let mut task = Task::new("leftover", "Today");
    task.plan_id = Some(plan.id);
    repo.tasks.create(&task).await.expect("task");

    assert!(planner.delete_plan(plan.id).await.expect("delete"));
    assert!(repo.plans.get(plan.id).await.expect("get").is_none());

    // Unlike flush, delete severs the plan link.
    let row = repo.tasks.get(task.id).await.expect("get").expect("row");
    assert!(row.is_archived);
    assert_eq!(row.plan_id, None);
}
