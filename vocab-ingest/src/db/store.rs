//! SQLite implementation of the card and tag collaborators

use sqlx::SqlitePool;
use uuid::Uuid;

use super::{cards, tags};
use crate::error::RemoteError;
use crate::models::{Card, Tag};
use crate::types::{CardStore, TagStore};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CardStore for SqliteStore {
    async fn load_all(&self) -> Result<Vec<Card>, RemoteError> {
        Ok(cards::load_all_cards(&self.pool).await?)
    }

    async fn batch_upsert(&self, cards: &[Card]) -> Result<Vec<Card>, RemoteError> {
        Ok(cards::upsert_cards(&self.pool, cards).await?)
    }

    async fn upsert_one(&self, card: &Card) -> Result<Card, RemoteError> {
        Ok(cards::upsert_card(&self.pool, card).await?)
    }

    async fn set_tag_associations(
        &self,
        card_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<(), RemoteError> {
        Ok(cards::set_card_tags(&self.pool, card_id, tag_ids).await?)
    }
}

#[async_trait::async_trait]
impl TagStore for SqliteStore {
    async fn list(&self) -> Result<Vec<Tag>, RemoteError> {
        Ok(tags::list_tags(&self.pool).await?)
    }

    async fn create(&self, name: &str, description: &str) -> Result<Tag, RemoteError> {
        Ok(tags::create_tag(&self.pool, name, description).await?)
    }
}
