use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::mindmap::tree::{NodeKind, PlanTree};

/// Plan-to-root edges start invisible (detached) so a freshly assigned task
/// floats next to the map until the user draws the connection. Task-to-task
/// edges are always visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Visible,
    Detached,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MindMapNode {
    pub id: Uuid,
    pub kind: NodeKind,
    pub label: String,
    pub status: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MindMapEdge {
    pub source: Uuid,
    pub target: Uuid,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Default)]
pub struct MindMapGraph {
    pub nodes: Vec<MindMapNode>,
    pub edges: Vec<MindMapEdge>,
}

impl MindMapGraph {
    /// Flattens the arena: one node per slot, one edge per parent/child pair.
    pub fn from_tree(tree: &PlanTree) -> Self {
        let nodes = tree
            .nodes()
            .iter()
            .map(|n| MindMapNode {
                id: n.id,
                kind: n.kind,
                label: n.title.clone(),
                status: n.status.clone(),
                completed: n.completed,
            })
            .collect();

        let mut edges = Vec::new();
        for node in tree.nodes() {
            for &child in &node.children {
                let child_node = tree.node(child);
                let kind = if node.kind == NodeKind::Plan && child_node.detached {
                    EdgeKind::Detached
                } else {
                    EdgeKind::Visible
                };
                edges.push(MindMapEdge {
                    source: node.id,
                    target: child_node.id,
                    kind,
                });
            }
        }

        Self { nodes, edges }
    }

    pub fn node(&self, id: Uuid) -> Option<&MindMapNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges drawn on screen; detached plan edges are structural only.
    pub fn visible_edges(&self) -> impl Iterator<Item = &MindMapEdge> {
        self.edges.iter().filter(|e| e.kind == EdgeKind::Visible)
    }

    /// Parent of each node, detached edges included (they still shape the
    /// hierarchy).
    pub fn parent_of(&self, id: Uuid) -> Option<Uuid> {
        self.edges.iter().find(|e| e.target == id).map(|e| e.source)
    }
}

/// Where an edge gesture starts: the plan hub or a task node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEndpoint {
    Plan,
    Task(Uuid),
}

/// Parent-link change a mutation wants persisted. `detached: None` leaves the
/// metadata flag as it is.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPatch {
    pub task_id: Uuid,
    pub parent_task_id: Option<Uuid>,
    pub detached: Option<bool>,
}

/// Connecting from the plan hub promotes the target to a visibly attached
/// root; connecting from a task re-parents the target under it.
pub fn connect(source: MapEndpoint, target: Uuid) -> Result<LinkPatch, DomainError> {
    match source {
        MapEndpoint::Task(src) if src == target => Err(DomainError::Validation(
            "cannot connect a node to itself".into(),
        )),
        MapEndpoint::Plan => Ok(LinkPatch {
            task_id: target,
            parent_task_id: None,
            detached: Some(false),
        }),
        MapEndpoint::Task(src) => Ok(LinkPatch {
            task_id: target,
            parent_task_id: Some(src),
            detached: None,
        }),
    }
}

/// Removing an edge always leaves the target a detached root: a plan edge
/// just turns invisible again, a task edge clears the parent pointer too.
pub fn delete_edge(_source: MapEndpoint, target: Uuid) -> LinkPatch {
    LinkPatch {
        task_id: target,
        parent_task_id: None,
        detached: Some(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::Plan;
    use crate::domain::task::Task;

    #[test]
    fn test_edge_classification() {
        let plan = Plan::new("Launch", None);
        let mut attached = Task::new("attached", "Backlogs");
        attached.plan_id = Some(plan.id);
        attached.set_detached(false);
        let mut floating = Task::new("floating", "Backlogs");
        floating.plan_id = Some(plan.id);
        let mut sub = Task::new("sub", "Backlogs");
        sub.plan_id = Some(plan.id);
        sub.parent_task_id = Some(floating.id);

        let tree = PlanTree::build(&plan, &[attached.clone(), floating.clone(), sub.clone()]);
        let graph = MindMapGraph::from_tree(&tree);

        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.edges.len(), 3);

        let edge_to = |id: Uuid| graph.edges.iter().find(|e| e.target == id).unwrap();
        assert_eq!(edge_to(attached.id).kind, EdgeKind::Visible);
        assert_eq!(edge_to(floating.id).kind, EdgeKind::Detached);
        // Task-to-task edges are visible even under a detached root.
        assert_eq!(edge_to(sub.id).kind, EdgeKind::Visible);
        assert_eq!(graph.visible_edges().count(), 2);
    }

    #[test]
    fn test_connect_rejects_self_link() {
        let id = Uuid::new_v4();
        assert!(connect(MapEndpoint::Task(id), id).is_err());
    }

    #[test]
    fn test_connect_from_plan_makes_visible_root() {
        let target = Uuid::new_v4();
        let patch = connect(MapEndpoint::Plan, target).unwrap();
        assert_eq!(patch.parent_task_id, None);
        assert_eq!(patch.detached, Some(false));
    }

    #[test]
    fn test_connect_from_task_reparents_without_touching_flag() {
        let src = Uuid::new_v4();
        let target = Uuid::new_v4();
        let patch = connect(MapEndpoint::Task(src), target).unwrap();
        assert_eq!(patch.parent_task_id, Some(src));
        assert_eq!(patch.detached, None);
    }

    #[test]
    fn test_delete_edge_always_detaches() {
        let target = Uuid::new_v4();
        let from_plan = delete_edge(MapEndpoint::Plan, target);
        assert_eq!(from_plan.parent_task_id, None);
        assert_eq!(from_plan.detached, Some(true));

        let from_task = delete_edge(MapEndpoint::Task(Uuid::new_v4()), target);
        assert_eq!(from_task.parent_task_id, None);
        assert_eq!(from_task.detached, Some(true));
    }
}
