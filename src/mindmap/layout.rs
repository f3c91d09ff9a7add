use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

use crate::mindmap::graph::MindMapGraph;

pub const NODE_WIDTH: f64 = 140.0;
pub const NODE_HEIGHT: f64 = 40.0;
pub const SIBLING_GAP: f64 = 40.0;
pub const RANK_GAP: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Layered top-to-bottom layout: rank is BFS depth from the plan hub, x is
/// the slot within the rank. Detached edges participate so floating roots
/// still sit in the root rank.
pub fn layered(graph: &MindMapGraph) -> HashMap<Uuid, Position> {
    let mut g: DiGraphMap<Uuid, ()> = DiGraphMap::new();
    for node in &graph.nodes {
        g.add_node(node.id);
    }
    for edge in &graph.edges {
        g.add_edge(edge.source, edge.target, ());
    }

    let mut rank: HashMap<Uuid, usize> = HashMap::new();
    let mut queue: VecDeque<Uuid> = g
        .nodes()
        .filter(|&n| g.neighbors_directed(n, Direction::Incoming).next().is_none())
        .collect();
    for &root in &queue {
        rank.insert(root, 0);
    }
    while let Some(node) = queue.pop_front() {
        let depth = rank[&node];
        for child in g.neighbors_directed(node, Direction::Outgoing) {
            if !rank.contains_key(&child) {
                rank.insert(child, depth + 1);
                queue.push_back(child);
            }
        }
    }

    // Slot assignment follows the node list order, so sibling order on screen
    // matches the fetch order.
    let mut next_slot: HashMap<usize, usize> = HashMap::new();
    let mut positions = HashMap::with_capacity(graph.nodes.len());
    for node in &graph.nodes {
        let depth = rank.get(&node.id).copied().unwrap_or(0);
        let slot = next_slot.entry(depth).or_insert(0);
        positions.insert(
            node.id,
            Position {
                x: *slot as f64 * (NODE_WIDTH + SIBLING_GAP),
                y: depth as f64 * (NODE_HEIGHT + RANK_GAP),
            },
        );
        *slot += 1;
    }
    positions
}

/// Position memory across refreshes. A node keeps its previous position as
/// long as its parent-edge source is unchanged; new nodes and re-parented
/// subtrees take the fresh layout.
#[derive(Debug, Default)]
pub struct StableLayout {
    positions: HashMap<Uuid, Position>,
    parents: HashMap<Uuid, Uuid>,
}

impl StableLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh(&mut self, graph: &MindMapGraph) -> HashMap<Uuid, Position> {
        let mut merged = layered(graph);
        let parents: HashMap<Uuid, Uuid> = graph
            .edges
            .iter()
            .map(|e| (e.target, e.source))
            .collect();

        for (id, pos) in merged.iter_mut() {
            if parents.get(id) != self.parents.get(id) {
                continue;
            }
            if let Some(previous) = self.positions.get(id) {
                *pos = *previous;
            }
        }

        self.positions = merged.clone();
        self.parents = parents;
        merged
    }
}
