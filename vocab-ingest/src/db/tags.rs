//! Tag database operations

use sqlx::{Row, SqlitePool};
use uuid::Uuid;
use vocab_common::{Error, Result};

use crate::models::Tag;

fn tag_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Tag> {
    let id: String = row.get("id");
    Ok(Tag {
        id: Uuid::parse_str(&id)
            .map_err(|e| Error::Internal(format!("Failed to parse tag id: {}", e)))?,
        name: row.get("name"),
        description: row.get("description"),
    })
}

pub async fn list_tags(pool: &SqlitePool) -> Result<Vec<Tag>> {
    let rows = sqlx::query("SELECT id, name, description FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;

    rows.iter().map(tag_from_row).collect()
}

/// Create a tag, or return the existing one with the same name
/// (case-insensitive)
pub async fn create_tag(pool: &SqlitePool, name: &str, description: &str) -> Result<Tag> {
    sqlx::query(
        r#"
        INSERT INTO tags (id, name, description) VALUES (?, ?, ?)
        ON CONFLICT(name) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name)
    .bind(description)
    .execute(pool)
    .await?;

    let row = sqlx::query("SELECT id, name, description FROM tags WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await?;

    tag_from_row(&row)
}
