//! Duplicate detection against the stored card set

use std::collections::HashSet;
use std::sync::Arc;

use super::normalizer::dedup_key;
use crate::error::RemoteError;
use crate::models::Card;
use crate::types::CardStore;
use crate::utils::RetryPolicy;

/// Normalized input split into stored and new words
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicatePartition {
    /// Words already stored, in input order and casing
    pub duplicates: Vec<String>,
    /// Words to create, in input order
    pub new_words: Vec<String>,
}

/// Split `words` against the dedup keys of `existing`
///
/// Each word is compared with the stored set only. Two equal words within one
/// request both land in `new_words`.
pub fn partition(words: &[String], existing: &[Card]) -> DuplicatePartition {
    let stored: HashSet<String> = existing.iter().map(|card| dedup_key(&card.text)).collect();

    let (duplicates, new_words): (Vec<String>, Vec<String>) = words
        .iter()
        .cloned()
        .partition(|word| stored.contains(&dedup_key(word)));

    DuplicatePartition {
        duplicates,
        new_words,
    }
}

/// Loads the stored card snapshot once per run and partitions the input
pub struct DuplicateDetector {
    store: Arc<dyn CardStore>,
    retry: RetryPolicy,
}

impl DuplicateDetector {
    pub fn new(store: Arc<dyn CardStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    pub async fn check(&self, words: &[String]) -> Result<DuplicatePartition, RemoteError> {
        let existing = self
            .retry
            .run("load card snapshot", || self.store.load_all())
            .await?;

        let result = partition(words, &existing);

        tracing::info!(
            stored_cards = existing.len(),
            duplicates = result.duplicates.len(),
            new_words = result.new_words.len(),
            "Duplicate check complete"
        );

        Ok(result)
    }
}
