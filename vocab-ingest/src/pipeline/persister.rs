//! Card record assembly and persistence
//!
//! The add pipeline stores all new cards in one batch upsert; tag
//! associations follow as a best-effort second write per card. The backfill
//! pipeline stores cards one at a time.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::RemoteError;
use crate::models::{Card, CardType, ImageOutcome, TranslationOutcome};
use crate::types::CardStore;
use crate::utils::RetryPolicy;

/// Shared attributes for every card of one bulk add run
#[derive(Debug, Clone)]
pub struct CardTemplate {
    pub card_type: CardType,
    pub tag_ids: Vec<Uuid>,
    pub level_id: Option<String>,
}

impl CardTemplate {
    /// Requested tags followed by the review tag, without repeats
    pub fn new(
        card_type: CardType,
        requested_tags: &[Uuid],
        review_tag: Option<Uuid>,
        level_id: Option<String>,
    ) -> Self {
        let mut seen = HashSet::new();
        let tag_ids = requested_tags
            .iter()
            .copied()
            .chain(review_tag)
            .filter(|id| seen.insert(*id))
            .collect();

        Self {
            card_type,
            tag_ids,
            level_id,
        }
    }
}

/// Merge each new word with its translation and image outcome
///
/// `translations` and `images` are indexed like `words`. Failed outcomes leave
/// the corresponding field empty.
pub fn build_cards(
    words: &[String],
    translations: &[TranslationOutcome],
    images: &[ImageOutcome],
    template: &CardTemplate,
) -> Vec<Card> {
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let mut card = Card::new(word.clone(), template.card_type);
            card.translation = translations.get(i).and_then(|o| o.value().cloned());
            card.image_url = images.get(i).and_then(|o| o.value().cloned());
            card.tag_ids = template.tag_ids.clone();
            card.level_id = template.level_id.clone();
            card
        })
        .collect()
}

pub struct Persister {
    store: Arc<dyn CardStore>,
    retry: RetryPolicy,
}

impl Persister {
    pub fn new(store: Arc<dyn CardStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Store all cards as one unit of work
    pub async fn persist_batch(&self, cards: &[Card]) -> Result<Vec<Card>, RemoteError> {
        self.retry
            .run("batch card upsert", || self.store.batch_upsert(cards))
            .await
    }

    /// Write tag associations for stored cards. Failures are logged only.
    ///
    /// Returns the number of cards whose associations could not be written.
    pub async fn apply_tags(&self, cards: &[Card]) -> usize {
        let mut failures = 0;

        for card in cards.iter().filter(|card| !card.tag_ids.is_empty()) {
            let result = self
                .retry
                .run("set card tags", || {
                    self.store.set_tag_associations(card.id, &card.tag_ids)
                })
                .await;

            if let Err(e) = result {
                failures += 1;
                tracing::warn!(
                    card_id = %card.id,
                    text = %card.text,
                    error = %e,
                    "Failed to write tag associations, card kept without tags"
                );
            }
        }

        failures
    }

    /// Store one card with a new image URL (backfill)
    pub async fn persist_image(&self, card: &Card, image_url: String) -> Result<Card, RemoteError> {
        let mut updated = card.clone();
        updated.image_url = Some(image_url);
        updated.updated_at = Utc::now();

        self.retry
            .run("card upsert", || self.store.upsert_one(&updated))
            .await
    }
}
