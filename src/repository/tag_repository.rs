use anyhow::Result;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::tag::{Tag, TagColor};

#[derive(Clone)]
pub struct TagRepository {
    pool: Arc<SqlitePool>,
}

impl TagRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, tag: &Tag) -> Result<()> {
        sqlx::query("INSERT INTO tags (id, name, color) VALUES (?, ?, ?)")
            .bind(tag.id.to_string())
            .bind(&tag.name)
            .bind(tag.color.as_str())
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    pub async fn update(&self, tag: &Tag) -> Result<()> {
        sqlx::query("UPDATE tags SET name = ?, color = ? WHERE id = ?")
            .bind(&tag.name)
            .bind(tag.color.as_str())
            .bind(tag.id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_all(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, name, color FROM tags ORDER BY name")
            .fetch_all(self.pool.as_ref())
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Tag {
                    id: Uuid::parse_str(row.get("id"))?,
                    name: row.get("name"),
                    color: TagColor::parse(row.get("color")),
                })
            })
            .collect()
    }
}
