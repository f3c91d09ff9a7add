use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::note::{Breadcrumb, Folder, Note};

#[derive(Clone)]
pub struct NoteRepository {
    pool: Arc<SqlitePool>,
}

impl NoteRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    // --- Folders ---

    pub async fn create_folder(&self, folder: &Folder) -> Result<()> {
        sqlx::query("INSERT INTO folders (id, name, parent_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(folder.id.to_string())
            .bind(&folder.name)
            .bind(folder.parent_id.map(|id| id.to_string()))
            .bind(folder.created_at.to_rfc3339())
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    /// Child folders of `parent` (root when `None`), by name.
    pub async fn list_folders(&self, parent: Option<Uuid>) -> Result<Vec<Folder>> {
        let rows = match parent {
            Some(id) => {
                sqlx::query(
                    "SELECT id, name, parent_id, created_at FROM folders \
                     WHERE parent_id = ? ORDER BY name",
                )
                .bind(id.to_string())
                .fetch_all(self.pool.as_ref())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, name, parent_id, created_at FROM folders \
                     WHERE parent_id IS NULL ORDER BY name",
                )
                .fetch_all(self.pool.as_ref())
                .await?
            }
        };

        rows.into_iter().map(row_to_folder).collect()
    }

    /// Ancestor path of a folder, root first.
    pub async fn folder_path(&self, folder_id: Uuid) -> Result<Vec<Breadcrumb>> {
        let rows = sqlx::query(
            r#"
            WITH RECURSIVE path(id, name, parent_id, depth) AS (
                SELECT id, name, parent_id, 0 FROM folders WHERE id = ?
                UNION ALL
                SELECT f.id, f.name, f.parent_id, p.depth + 1
                FROM folders f JOIN path p ON f.id = p.parent_id
            )
            SELECT id, name FROM path ORDER BY depth DESC
            "#,
        )
        .bind(folder_id.to_string())
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Breadcrumb {
                    id: Uuid::parse_str(row.get("id"))?,
                    name: row.get("name"),
                })
            })
            .collect()
    }

    // --- Notes ---

    pub async fn create_note(&self, note: &Note) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notes (id, title, content, pinned, folder_id, plan_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(note.id.to_string())
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.pinned as i32)
        .bind(note.folder_id.map(|id| id.to_string()))
        .bind(note.plan_id.map(|id| id.to_string()))
        .bind(note.created_at.to_rfc3339())
        .bind(note.updated_at.to_rfc3339())
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    pub async fn update_note(&self, note: &Note) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE notes SET title = ?, content = ?, pinned = ?, folder_id = ?,
                plan_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.pinned as i32)
        .bind(note.folder_id.map(|id| id.to_string()))
        .bind(note.plan_id.map(|id| id.to_string()))
        .bind(note.updated_at.to_rfc3339())
        .bind(note.id.to_string())
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    pub async fn delete_note(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Notes of one directory (root when `None`), most recently updated first.
    pub async fn list_notes(&self, folder: Option<Uuid>) -> Result<Vec<Note>> {
        const COLS: &str = "id, title, content, pinned, folder_id, plan_id, created_at, updated_at";
        let rows = match folder {
            Some(id) => {
                sqlx::query(&format!(
                    "SELECT {} FROM notes WHERE folder_id = ? ORDER BY updated_at DESC",
                    COLS
                ))
                .bind(id.to_string())
                .fetch_all(self.pool.as_ref())
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM notes WHERE folder_id IS NULL ORDER BY updated_at DESC",
                    COLS
                ))
                .fetch_all(self.pool.as_ref())
                .await?
            }
        };

        rows.into_iter().map(row_to_note).collect()
    }

    pub async fn move_note(&self, note_id: Uuid, target_folder: Option<Uuid>) -> Result<()> {
        sqlx::query("UPDATE notes SET folder_id = ? WHERE id = ?")
            .bind(target_folder.map(|id| id.to_string()))
            .bind(note_id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}

fn row_to_folder(row: sqlx::sqlite::SqliteRow) -> Result<Folder> {
    Ok(Folder {
        id: Uuid::parse_str(row.get("id"))?,
        name: row.get("name"),
        parent_id: row
            .get::<Option<String>, _>("parent_id")
            .and_then(|s| Uuid::parse_str(&s).ok()),
        created_at: DateTime::parse_from_rfc3339(row.get("created_at"))?.with_timezone(&Utc),
    })
}

fn row_to_note(row: sqlx::sqlite::SqliteRow) -> Result<Note> {
    Ok(Note {
        id: Uuid::parse_str(row.get("id"))?,
        title: row.get("title"),
        content: row.get("content"),
        pinned: row.get::<i32, _>("pinned") != 0,
        folder_id: row
            .get::<Option<String>, _>("folder_id")
            .and_then(|s| Uuid::parse_str(&s).ok()),
        plan_id: row
            .get::<Option<String>, _>("plan_id")
            .and_then(|s| Uuid::parse_str(&s).ok()),
        created_at: DateTime::parse_from_rfc3339(row.get("created_at"))?.with_timezone(&Utc),
        updated_at: DateTime::parse_from_rfc3339(row.get("updated_at"))?.with_timezone(&Utc),
    })
}
