pub mod board;
pub mod mindmap;
pub mod planner;
pub mod settings;

pub use board::BoardService;
pub use mindmap::{MindMapService, TreeEvent};
pub use planner::PlannerService;
pub use settings::SettingsService;
