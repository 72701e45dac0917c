//! Bulk add request and result

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Card, Failure};

/// Raw bulk add submission
///
/// `card_type` stays a string so that unknown subtypes reach the normalizer
/// and come back as a `ValidationError` instead of a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAddRequest {
    /// Words in submission order, not yet trimmed
    pub words: Vec<String>,
    pub card_type: String,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
    #[serde(default)]
    pub level_id: Option<String>,
    /// Also attach the review tag to every created card
    #[serde(default)]
    pub attach_review_tag: bool,
}

impl BulkAddRequest {
    pub fn new(words: Vec<String>, card_type: impl Into<String>) -> Self {
        Self {
            words,
            card_type: card_type.into(),
            tag_ids: Vec::new(),
            level_id: None,
            attach_review_tag: false,
        }
    }
}

/// Outcome of a completed bulk add run
///
/// Reconciles as `total_words == cards_created + duplicates_skipped +
/// persist_errors.len()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkAddResult {
    /// Normalized word count
    pub total_words: usize,
    pub cards_created: usize,
    pub duplicates_skipped: usize,
    pub translation_failures: Vec<Failure>,
    pub image_failures: Vec<Failure>,
    /// One entry per new word that did not end up stored
    pub persist_errors: Vec<Failure>,
    pub created_cards: Vec<Card>,
    /// Input words (original casing) that already existed in the store
    pub duplicate_words: Vec<String>,
    /// Review tag was ensured and attached to the created cards
    pub review_tag_applied: bool,
}

impl BulkAddResult {
    pub fn is_reconciled(&self) -> bool {
        self.total_words == self.cards_created + self.duplicates_skipped + self.persist_errors.len()
            && self.created_cards.len() == self.cards_created
            && self.duplicate_words.len() == self.duplicates_skipped
    }

    /// Translation, image and persistence failures combined
    pub fn failure_count(&self) -> usize {
        self.translation_failures.len() + self.image_failures.len() + self.persist_errors.len()
    }
}
