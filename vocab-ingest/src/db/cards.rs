//! Card database operations

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;
use vocab_common::{Error, Result};

use crate::models::{Card, CardType};

fn parse_uuid(value: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Failed to parse {}: {}", column, e)))
}

fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse {}: {}", column, e)))
}

fn card_from_row(row: &SqliteRow) -> Result<Card> {
    let id: String = row.get("id");
    let card_type: String = row.get("card_type");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Card {
        id: parse_uuid(&id, "id")?,
        text: row.get("text"),
        card_type: card_type
            .parse::<CardType>()
            .map_err(Error::Internal)?,
        translation: row.get("translation"),
        image_url: row.get("image_url"),
        level_id: row.get("level_id"),
        tag_ids: Vec::new(),
        created_at: parse_timestamp(&created_at, "created_at")?,
        updated_at: parse_timestamp(&updated_at, "updated_at")?,
    })
}

/// Load every card with its tag ids, oldest first
pub async fn load_all_cards(pool: &SqlitePool) -> Result<Vec<Card>> {
    let rows = sqlx::query(
        r#"
        SELECT id, text, card_type, translation, image_url, level_id, created_at, updated_at
        FROM cards
        ORDER BY created_at, rowid
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut cards = rows.iter().map(card_from_row).collect::<Result<Vec<_>>>()?;

    let tag_rows = sqlx::query("SELECT card_id, tag_id FROM card_tags ORDER BY rowid")
        .fetch_all(pool)
        .await?;

    let mut tags_by_card: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for row in &tag_rows {
        let card_id: String = row.get("card_id");
        let tag_id: String = row.get("tag_id");
        tags_by_card
            .entry(parse_uuid(&card_id, "card_id")?)
            .or_default()
            .push(parse_uuid(&tag_id, "tag_id")?);
    }

    for card in &mut cards {
        if let Some(tag_ids) = tags_by_card.remove(&card.id) {
            card.tag_ids = tag_ids;
        }
    }

    Ok(cards)
}

async fn upsert_card_with<'e, E>(executor: E, card: &Card) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO cards (
            id, text, card_type, translation, image_url, level_id, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            text = excluded.text,
            card_type = excluded.card_type,
            translation = excluded.translation,
            image_url = excluded.image_url,
            level_id = excluded.level_id,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(card.id.to_string())
    .bind(card.text.clone())
    .bind(card.card_type.as_str())
    .bind(card.translation.clone())
    .bind(card.image_url.clone())
    .bind(card.level_id.clone())
    .bind(card.created_at.to_rfc3339())
    .bind(card.updated_at.to_rfc3339())
    .execute(executor)
    .await?;

    Ok(())
}

/// Insert or update all cards in one transaction
///
/// Tag associations are not touched.
pub async fn upsert_cards(pool: &SqlitePool, cards: &[Card]) -> Result<Vec<Card>> {
    let mut tx = pool.begin().await?;

    for card in cards {
        upsert_card_with(&mut *tx, card).await?;
    }

    tx.commit().await?;

    tracing::debug!(count = cards.len(), "Cards upserted");
    Ok(cards.to_vec())
}

/// Insert or update one card
pub async fn upsert_card(pool: &SqlitePool, card: &Card) -> Result<Card> {
    upsert_card_with(pool, card).await?;
    Ok(card.clone())
}

/// Replace the tag set of a card
pub async fn set_card_tags(pool: &SqlitePool, card_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
    let card_id = card_id.to_string();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM card_tags WHERE card_id = ?")
        .bind(&card_id)
        .execute(&mut *tx)
        .await?;

    for tag_id in tag_ids {
        sqlx::query("INSERT OR IGNORE INTO card_tags (card_id, tag_id) VALUES (?, ?)")
            .bind(&card_id)
            .bind(tag_id.to_string())
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}
