use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::plan::{Plan, PlanStatus};

#[derive(Clone)]
pub struct PlanRepository {
    pool: Arc<SqlitePool>,
}

impl PlanRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, plan: &Plan) -> Result<()> {
        sqlx::query(
            "INSERT INTO plans (id, title, description, status, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(plan.id.to_string())
        .bind(&plan.title)
        .bind(&plan.description)
        .bind(plan.status.as_str())
        .bind(plan.created_at.to_rfc3339())
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    pub async fn update(&self, plan: &Plan) -> Result<()> {
        sqlx::query("UPDATE plans SET title = ?, description = ?, status = ? WHERE id = ?")
            .bind(&plan.title)
            .bind(&plan.description)
            .bind(plan.status.as_str())
            .bind(plan.id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    pub async fn set_status(&self, id: Uuid, status: &PlanStatus) -> Result<()> {
        sqlx::query("UPDATE plans SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Plan>> {
        let row = sqlx::query(
            "SELECT id, title, description, status, created_at FROM plans WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(row_to_plan).transpose()
    }

    /// Active board: archived plans stay hidden. Creation order, so plans fall
    /// to column end implicitly.
    pub async fn list_active(&self) -> Result<Vec<Plan>> {
        let rows = sqlx::query(
            "SELECT id, title, description, status, created_at FROM plans \
             WHERE status != 'Archived' ORDER BY created_at",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(row_to_plan).collect()
    }

    /// How many active plans still reference a section title as their status.
    pub async fn count_active_by_status(&self, status: &str) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM plans WHERE status = ? AND status != 'Archived'",
        )
        .bind(status)
        .fetch_one(self.pool.as_ref())
        .await?;
        Ok(count.0)
    }

    /// Flush commit: archives the plans and their tasks together. Tasks keep
    /// their plan_id so historical stats stay queryable.
    pub async fn archive_with_tasks(&self, ids: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for id in ids {
            sqlx::query("UPDATE tasks SET is_archived = 1 WHERE plan_id = ?")
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE plans SET status = 'Archived' WHERE id = ?")
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Plan deletion: soft-archive and detach the tasks, then hard-delete the
    /// plan row. Distinct from flush on purpose.
    pub async fn delete_cascade(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE tasks SET is_archived = 1, plan_id = NULL WHERE plan_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM plans WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_plan(row: sqlx::sqlite::SqliteRow) -> Result<Plan> {
    Ok(Plan {
        id: Uuid::parse_str(row.get("id"))?,
        title: row.get("title"),
        description: row.get("description"),
        status: PlanStatus::parse(row.get("status")),
        created_at: DateTime::parse_from_rfc3339(row.get("created_at"))?.with_timezone(&Utc),
    })
}
