use anyhow::Result;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

use crate::domain::task::Task;
use crate::mindmap::graph::{self, LinkPatch, MapEndpoint, MindMapGraph};
use crate::mindmap::layout::{Position, StableLayout};
use crate::mindmap::tree::PlanTree;
use crate::repository::Repository;

/// Broadcast to every open map view when a mutation lands.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeEvent {
    Refreshed { plan_id: Uuid },
}

/// One rendered map: the structural graph plus a position per node.
#[derive(Debug, Clone)]
pub struct MapSnapshot {
    pub graph: MindMapGraph,
    pub positions: HashMap<Uuid, Position>,
}

/// Mind-map reads and edge mutations. Every mutation persists a parent-link
/// patch, refetches the tree, and announces the refresh on the broadcast
/// channel.
pub struct MindMapService {
    repo: Repository,
    events: broadcast::Sender<TreeEvent>,
    layouts: Mutex<HashMap<Uuid, StableLayout>>,
}

impl MindMapService {
    pub fn new(repo: Repository) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            repo,
            events,
            layouts: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.events.subscribe()
    }

    /// Builds the plan's current map. Layout positions are stable across
    /// calls for nodes whose parent edge did not change.
    pub async fn snapshot(&self, plan_id: Uuid) -> Result<MapSnapshot> {
        let Some(plan) = self.repo.plans.get(plan_id).await? else {
            anyhow::bail!("plan {} not found", plan_id);
        };
        let tasks = self.repo.tasks.list_by_plan(plan_id).await?;
        let graph = MindMapGraph::from_tree(&PlanTree::build(&plan, &tasks));

        let positions = {
            let mut layouts = self.layouts.lock().unwrap_or_else(|p| p.into_inner());
            layouts.entry(plan_id).or_default().refresh(&graph)
        };

        Ok(MapSnapshot { graph, positions })
    }

    /// Draws an edge: from the plan hub it promotes the target to a visible
    /// root, from a task it re-parents the target. Self-links are rejected.
    pub async fn connect(
        &self,
        plan_id: Uuid,
        source: MapEndpoint,
        target: Uuid,
    ) -> Result<MapSnapshot> {
        let patch = graph::connect(source, target)?;
        self.apply(plan_id, patch).await
    }

    /// Removes an edge; the target becomes a detached root either way.
    pub async fn delete_edge(
        &self,
        plan_id: Uuid,
        source: MapEndpoint,
        target: Uuid,
    ) -> Result<MapSnapshot> {
        let patch = graph::delete_edge(source, target);
        self.apply(plan_id, patch).await
    }

    /// Creates a task directly on the map, as a child of the given node.
    pub async fn add_child(
        &self,
        plan_id: Uuid,
        parent: MapEndpoint,
        title: impl Into<String>,
    ) -> Result<MapSnapshot> {
        let mut task = Task::new(title, "Backlogs");
        task.plan_id = Some(plan_id);
        match parent {
            MapEndpoint::Task(parent_id) => task.parent_task_id = Some(parent_id),
            // Children of the hub arrive detached, same as assignment.
            MapEndpoint::Plan => task.set_detached(true),
        }
        task.validate()?;
        self.repo.tasks.create(&task).await?;
        self.announce(plan_id);
        self.snapshot(plan_id).await
    }

    async fn apply(&self, plan_id: Uuid, patch: LinkPatch) -> Result<MapSnapshot> {
        match patch.detached {
            Some(detached) => {
                self.repo
                    .tasks
                    .set_parent_and_detached(patch.task_id, patch.parent_task_id, detached)
                    .await?
            }
            None => {
                self.repo
                    .tasks
                    .set_parent(patch.task_id, patch.parent_task_id)
                    .await?
            }
        }
        self.announce(plan_id);
        self.snapshot(plan_id).await
    }

    fn announce(&self, plan_id: Uuid) {
        // No receivers is fine; the next snapshot call sees fresh data anyway.
        let _ = self.events.send(TreeEvent::Refreshed { plan_id });
        info!(%plan_id, "map refreshed");
    }
}
