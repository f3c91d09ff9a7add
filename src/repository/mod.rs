pub mod app_state_repository;
pub mod database;
pub mod note_repository;
pub mod plan_repository;
pub mod section_repository;
pub mod tag_repository;
pub mod task_repository;

use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct Repository {
    pub pool: Arc<SqlitePool>,
    pub tasks: task_repository::TaskRepository,
    pub plans: plan_repository::PlanRepository,
    pub sections: section_repository::SectionRepository,
    pub tags: tag_repository::TagRepository,
    pub notes: note_repository::NoteRepository,
    pub app_state: app_state_repository::AppStateRepository,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        let pool = Arc::new(pool);
        Self {
            tasks: task_repository::TaskRepository::new(pool.clone()),
            plans: plan_repository::PlanRepository::new(pool.clone()),
            sections: section_repository::SectionRepository::new(pool.clone()),
            tags: tag_repository::TagRepository::new(pool.clone()),
            notes: note_repository::NoteRepository::new(pool.clone()),
            app_state: app_state_repository::AppStateRepository::new(pool.clone()),
            pool,
        }
    }
}
