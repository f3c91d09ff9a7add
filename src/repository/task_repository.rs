use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::tag::{Tag, TagColor};
use crate::domain::task::Task;

const TASK_COLUMNS: &str = "id, title, description, status, completed, duration, due_date, \
                            sort_order, parent_task_id, plan_id, metadata, is_archived, created_at";

#[derive(Clone)]
pub struct TaskRepository {
    pool: Arc<SqlitePool>,
}

impl TaskRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, task: &Task) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, title, description, status, completed, duration, due_date,
                sort_order, parent_task_id, plan_id, metadata, is_archived, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(task.id.to_string())
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.status)
        .bind(task.completed as i32)
        .bind(task.duration)
        .bind(task.due_date.map(|d| d.to_rfc3339()))
        .bind(task.sort_order)
        .bind(task.parent_task_id.map(|id| id.to_string()))
        .bind(task.plan_id.map(|id| id.to_string()))
        .bind(serde_json::to_string(&task.metadata)?)
        .bind(task.is_archived as i32)
        .bind(task.created_at.to_rfc3339())
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    pub async fn update(&self, task: &Task) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tasks SET
                title = ?, description = ?, status = ?, completed = ?, duration = ?,
                due_date = ?, sort_order = ?, parent_task_id = ?, plan_id = ?,
                metadata = ?, is_archived = ?
            WHERE id = ?
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.status)
        .bind(task.completed as i32)
        .bind(task.duration)
        .bind(task.due_date.map(|d| d.to_rfc3339()))
        .bind(task.sort_order)
        .bind(task.parent_task_id.map(|id| id.to_string()))
        .bind(task.plan_id.map(|id| id.to_string()))
        .bind(serde_json::to_string(&task.metadata)?)
        .bind(task.is_archived as i32)
        .bind(task.id.to_string())
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Task>> {
        let row = sqlx::query(&format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(self.pool.as_ref())
            .await?;

        match row {
            Some(row) => {
                let mut task = row_to_task(row)?;
                task.tags = self.tags_for(task.id).await?;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    /// Board fetch: non-archived tasks with their tag sets, fractional key
    /// ascending, newest first among equals.
    pub async fn list_active(&self) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tasks WHERE is_archived = 0 \
             ORDER BY sort_order ASC, created_at DESC",
            TASK_COLUMNS
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        let mut tasks = Vec::with_capacity(rows.len());
        for row in rows {
            tasks.push(row_to_task(row)?);
        }
        self.attach_tags(&mut tasks).await?;
        Ok(tasks)
    }

    /// All non-archived tasks of one plan, in board order.
    pub async fn list_by_plan(&self, plan_id: Uuid) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tasks WHERE plan_id = ? AND is_archived = 0 \
             ORDER BY sort_order ASC, created_at DESC",
            TASK_COLUMNS
        ))
        .bind(plan_id.to_string())
        .fetch_all(self.pool.as_ref())
        .await?;

        let mut tasks = Vec::with_capacity(rows.len());
        for row in rows {
            tasks.push(row_to_task(row)?);
        }
        Ok(tasks)
    }

    pub async fn set_completed(&self, id: Uuid, completed: bool) -> Result<()> {
        sqlx::query("UPDATE tasks SET completed = ? WHERE id = ?")
            .bind(completed as i32)
            .bind(id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    /// The drop persistence pair.
    pub async fn set_status_and_order(&self, id: Uuid, status: &str, order: f64) -> Result<()> {
        sqlx::query("UPDATE tasks SET status = ?, sort_order = ? WHERE id = ?")
            .bind(status)
            .bind(order)
            .bind(id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    pub async fn set_order(&self, id: Uuid, order: f64) -> Result<()> {
        sqlx::query("UPDATE tasks SET sort_order = ? WHERE id = ?")
            .bind(order)
            .bind(id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    pub async fn set_archived(&self, id: Uuid, archived: bool) -> Result<()> {
        sqlx::query("UPDATE tasks SET is_archived = ? WHERE id = ?")
            .bind(archived as i32)
            .bind(id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    pub async fn set_plan(&self, id: Uuid, plan_id: Option<Uuid>) -> Result<()> {
        sqlx::query("UPDATE tasks SET plan_id = ? WHERE id = ?")
            .bind(plan_id.map(|p| p.to_string()))
            .bind(id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    pub async fn set_parent(&self, id: Uuid, parent_task_id: Option<Uuid>) -> Result<()> {
        sqlx::query("UPDATE tasks SET parent_task_id = ? WHERE id = ?")
            .bind(parent_task_id.map(|p| p.to_string()))
            .bind(id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    /// Mind-map link update: parent pointer plus the detached metadata flag in
    /// one statement.
    pub async fn set_parent_and_detached(
        &self,
        id: Uuid,
        parent_task_id: Option<Uuid>,
        detached: bool,
    ) -> Result<()> {
        let Some(mut task) = self.get(id).await? else {
            anyhow::bail!("task {} not found", id);
        };
        task.parent_task_id = parent_task_id;
        task.set_detached(detached);
        self.update(&task).await
    }

    pub async fn set_detached(&self, id: Uuid, detached: bool) -> Result<()> {
        let Some(mut task) = self.get(id).await? else {
            anyhow::bail!("task {} not found", id);
        };
        task.set_detached(detached);
        self.update(&task).await
    }

    /// Hard delete, used only by the dated cleanup and tests.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Settings cleanup: permanently removes archived tasks created before the
    /// cut-off. Returns the number of deleted rows.
    pub async fn delete_archived_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE is_archived = 1 AND created_at < ?")
            .bind(cutoff.to_rfc3339())
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected())
    }

    /// How many active tasks still reference a section title as their status.
    pub async fn count_active_by_status(&self, status: &str) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE status = ? AND is_archived = 0")
                .bind(status)
                .fetch_one(self.pool.as_ref())
                .await?;
        Ok(count.0)
    }

    // --- Tag links ---

    /// Replaces the task's tag set. Delete-all-then-insert, same trade-off as
    /// diffing without the bookkeeping.
    pub async fn set_tags(&self, task_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM task_tags WHERE task_id = ?")
            .bind(task_id.to_string())
            .execute(&mut *tx)
            .await?;
        for tag_id in tag_ids {
            sqlx::query("INSERT INTO task_tags (task_id, tag_id) VALUES (?, ?)")
                .bind(task_id.to_string())
                .bind(tag_id.to_string())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn tags_for(&self, task_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT t.id, t.name, t.color FROM task_tags tt \
             JOIN tags t ON t.id = tt.tag_id WHERE tt.task_id = ? ORDER BY t.name",
        )
        .bind(task_id.to_string())
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(row_to_tag).collect()
    }

    async fn attach_tags(&self, tasks: &mut [Task]) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }
        let rows = sqlx::query(
            "SELECT tt.task_id, t.id, t.name, t.color FROM task_tags tt \
             JOIN tags t ON t.id = tt.tag_id ORDER BY t.name",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        let mut by_task: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in rows {
            let task_id = Uuid::parse_str(row.get("task_id"))?;
            by_task.entry(task_id).or_default().push(row_to_tag(row)?);
        }
        for task in tasks.iter_mut() {
            if let Some(tags) = by_task.remove(&task.id) {
                task.tags = tags;
            }
        }
        Ok(())
    }
}

fn row_to_tag(row: sqlx::sqlite::SqliteRow) -> Result<Tag> {
    Ok(Tag {
        id: Uuid::parse_str(row.get("id"))?,
        name: row.get("name"),
        color: TagColor::parse(row.get("color")),
    })
}

fn row_to_task(row: sqlx::sqlite::SqliteRow) -> Result<Task> {
    Ok(Task {
        id: Uuid::parse_str(row.get("id"))?,
        title: row.get("title"),
        description: row.get("description"),
        status: row.get("status"),
        completed: row.get::<i32, _>("completed") != 0,
        duration: row.get("duration"),
        due_date: row
            .get::<Option<String>, _>("due_date")
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
        sort_order: row.get("sort_order"),
        parent_task_id: row
            .get::<Option<String>, _>("parent_task_id")
            .and_then(|s| Uuid::parse_str(&s).ok()),
        plan_id: row
            .get::<Option<String>, _>("plan_id")
            .and_then(|s| Uuid::parse_str(&s).ok()),
        metadata: serde_json::from_str(row.get("metadata"))?,
        is_archived: row.get::<i32, _>("is_archived") != 0,
        created_at: DateTime::parse_from_rfc3339(row.get("created_at"))?.with_timezone(&Utc),
        tags: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::database::init_test_database;

    async fn repo() -> TaskRepository {
        let pool = init_test_database().await.unwrap();
        TaskRepository::new(Arc::new(pool))
    }

    #[tokio::test]
    async fn test_task_crud() {
        let repo = repo().await;

        let mut task = Task::new("Test Task", "Today");
        task.duration = Some(30);
        repo.create(&task).await.unwrap();

        let fetched = repo.get(task.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Test Task");
        assert_eq!(fetched.duration, Some(30));
        assert!(!fetched.completed);

        let mut updated = fetched.clone();
        updated.title = "Updated".to_string();
        updated.status = "Later".to_string();
        repo.update(&updated).await.unwrap();

        let fetched = repo.get(task.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Updated");
        assert_eq!(fetched.status, "Later");

        assert!(repo.delete(task.id).await.unwrap());
        assert!(repo.get(task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_active_excludes_archived_and_orders_by_key() {
        let repo = repo().await;

        let mut a = Task::new("a", "Today");
        a.sort_order = 2000.0;
        let mut b = Task::new("b", "Today");
        b.sort_order = 1000.0;
        let mut archived = Task::new("archived", "Today");
        archived.is_archived = true;

        repo.create(&a).await.unwrap();
        repo.create(&b).await.unwrap();
        repo.create(&archived).await.unwrap();

        let tasks = repo.list_active().await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "b");
        assert_eq!(tasks[1].title, "a");
    }

    #[tokio::test]
    async fn test_metadata_round_trip() {
        let repo = repo().await;

        let mut task = Task::new("Root", "Backlogs");
        task.set_detached(false);
        repo.create(&task).await.unwrap();

        let fetched = repo.get(task.id).await.unwrap().unwrap();
        assert!(!fetched.is_detached());

        repo.set_detached(task.id, true).await.unwrap();
        let fetched = repo.get(task.id).await.unwrap().unwrap();
        assert!(fetched.is_detached());
    }

    #[tokio::test]
    async fn test_delete_archived_before_cutoff() {
        let repo = repo().await;

        let mut old = Task::new("old", "Today");
        old.is_archived = true;
        old.created_at = Utc::now() - chrono::Duration::days(60);
        let mut recent = Task::new("recent", "Today");
        recent.is_archived = true;
        let live = Task::new("live", "Today");

        repo.create(&old).await.unwrap();
        repo.create(&recent).await.unwrap();
        repo.create(&live).await.unwrap();

        let cutoff = Utc::now() - chrono::Duration::days(30);
        let deleted = repo.delete_archived_before(cutoff).await.unwrap();
        assert_eq!(deleted, 1);

        assert!(repo.get(old.id).await.unwrap().is_none());
        assert!(repo.get(recent.id).await.unwrap().is_some());
        assert!(repo.get(live.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_tag_links() {
        let pool = init_test_database().await.unwrap();
        let pool = Arc::new(pool);
        let repo = TaskRepository::new(pool.clone());
        let tags = crate::repository::tag_repository::TagRepository::new(pool);

        let urgent = Tag::new("urgent", TagColor::Red);
        tags.create(&urgent).await.unwrap();

        let task = Task::new("Tagged", "Today");
        repo.create(&task).await.unwrap();
        repo.set_tags(task.id, &[urgent.id]).await.unwrap();

        let fetched = repo.get(task.id).await.unwrap().unwrap();
        assert_eq!(fetched.tags.len(), 1);
        assert_eq!(fetched.tags[0].name, "urgent");

        let listed = repo.list_active().await.unwrap();
        assert_eq!(listed[0].tags.len(), 1);
    }
}
