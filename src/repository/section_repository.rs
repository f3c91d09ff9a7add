use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::section::{BoardKind, Section};

#[derive(Clone)]
pub struct SectionRepository {
    pool: Arc<SqlitePool>,
}

impl SectionRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn list(&self, board: BoardKind) -> Result<Vec<Section>> {
        let rows = sqlx::query(
            "SELECT id, title, position, board, created_at FROM sections \
             WHERE board = ? ORDER BY position",
        )
        .bind(board.as_str())
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(row_to_section).collect()
    }

    pub async fn create(&self, section: &Section) -> Result<()> {
        sqlx::query(
            "INSERT INTO sections (id, title, position, board, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(section.id.to_string())
        .bind(&section.title)
        .bind(section.position)
        .bind(section.board.as_str())
        .bind(section.created_at.to_rfc3339())
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    pub async fn update(&self, section: &Section) -> Result<()> {
        sqlx::query("UPDATE sections SET title = ?, position = ? WHERE id = ?")
            .bind(&section.title)
            .bind(section.position)
            .bind(section.id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sections WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_section(row: sqlx::sqlite::SqliteRow) -> Result<Section> {
    Ok(Section {
        id: Uuid::parse_str(row.get("id"))?,
        title: row.get("title"),
        position: row.get("position"),
        board: BoardKind::parse(row.get("board"))?,
        created_at: DateTime::parse_from_rfc3339(row.get("created_at"))?.with_timezone(&Utc),
    })
}
