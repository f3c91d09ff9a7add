pub mod google_tasks;

pub use google_tasks::GoogleTasksClient;
