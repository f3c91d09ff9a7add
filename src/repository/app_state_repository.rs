use anyhow::Result;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Small key-value store for UI state that must survive restarts,
/// e.g. the last active view.
#[derive(Clone)]
pub struct AppStateRepository {
    pool: Arc<SqlitePool>,
}

impl AppStateRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM app_state WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO app_state (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}
