//! Plan hierarchy as a mind-map: an arena tree assembled from flat task rows,
//! flattened into node/edge lists, and laid out as a layered top-to-bottom
//! graph with position stability across refreshes.

pub mod graph;
pub mod layout;
pub mod tree;

pub use graph::{EdgeKind, LinkPatch, MapEndpoint, MindMapEdge, MindMapGraph, MindMapNode};
pub use layout::{Position, StableLayout};
pub use tree::{NodeKind, PlanTree, TreeNode};
