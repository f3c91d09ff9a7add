use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::plan::Plan;
use crate::domain::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Plan,
    Task,
}

/// One arena slot. `children` holds arena indices, insertion-ordered.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: Uuid,
    pub kind: NodeKind,
    pub title: String,
    pub status: String,
    pub completed: bool,
    pub detached: bool,
    pub children: Vec<usize>,
}

/// Index-based arena over a plan and its tasks. Slot 0 is always the plan
/// root; task slots follow in the fetch order.
#[derive(Debug, Clone)]
pub struct PlanTree {
    nodes: Vec<TreeNode>,
}

impl PlanTree {
    /// Assembles the tree from flat rows. A task hangs under its
    /// `parent_task_id` when that parent is present in `tasks`; tasks whose
    /// parent is archived or missing attach at the plan root instead of
    /// disappearing.
    pub fn build(plan: &Plan, tasks: &[Task]) -> Self {
        let mut nodes = Vec::with_capacity(tasks.len() + 1);
        nodes.push(TreeNode {
            id: plan.id,
            kind: NodeKind::Plan,
            title: plan.title.clone(),
            status: plan.status.as_str().to_string(),
            completed: false,
            detached: false,
            children: Vec::new(),
        });

        let mut index_of: HashMap<Uuid, usize> = HashMap::with_capacity(tasks.len());
        for task in tasks {
            let index = nodes.len();
            index_of.insert(task.id, index);
            nodes.push(TreeNode {
                id: task.id,
                kind: NodeKind::Task,
                title: task.title.clone(),
                status: task.status.clone(),
                completed: task.completed,
                detached: task.is_detached(),
                children: Vec::new(),
            });
        }

        for task in tasks {
            let child = index_of[&task.id];
            let parent = task
                .parent_task_id
                .and_then(|pid| index_of.get(&pid).copied())
                .filter(|&p| p != child)
                .unwrap_or(0);
            nodes[parent].children.push(child);
        }

        Self { nodes }
    }

    pub fn root(&self) -> &TreeNode {
        &self.nodes[0]
    }

    pub fn node(&self, index: usize) -> &TreeNode {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Slot 0 (the plan root) always exists.
    pub fn is_empty(&self) -> bool {
        false
    }
}
