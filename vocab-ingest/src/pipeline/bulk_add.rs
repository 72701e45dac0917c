//! Bulk add pipeline
//!
//! # Stage Progression
//! VALIDATING → CHECKING-DUPLICATES → TRANSLATING → GENERATING-IMAGES → PERSISTING
//!
//! Only validation can fail the call. Every later failure (duplicate check,
//! translation, image, persistence) is recorded in the `BulkAddResult` and
//! the run carries on with whatever it has.

use std::collections::HashSet;
use uuid::Uuid;
use vocab_common::config::PipelineConfig;
use vocab_common::events::PipelineStage;

use super::duplicates::DuplicateDetector;
use super::images::ImageStage;
use super::normalizer::{validate_request, WordBounds};
use super::persister::{build_cards, CardTemplate, Persister};
use super::progress::{ProgressObserver, ProgressReporter, ResultAggregator};
use super::tags::TagEnsurer;
use super::translation::TranslationStage;
use super::Collaborators;
use crate::error::ValidationError;
use crate::models::{BulkAddRequest, BulkAddResult, FailureStage};
use crate::utils::RetryPolicy;

pub struct BulkAddPipeline {
    bounds: WordBounds,
    duplicates: DuplicateDetector,
    review_tag: TagEnsurer,
    translation: TranslationStage,
    images: ImageStage,
    persister: Persister,
}

impl BulkAddPipeline {
    pub fn new(collaborators: &Collaborators, config: &PipelineConfig, retry: RetryPolicy) -> Self {
        Self {
            bounds: WordBounds {
                min: config.min_words,
                max: config.max_words,
            },
            duplicates: DuplicateDetector::new(collaborators.cards.clone(), retry.clone()),
            review_tag: TagEnsurer::new(
                collaborators.tags.clone(),
                retry.clone(),
                config.review_tag_name.clone(),
                config.review_tag_description.clone(),
            ),
            translation: TranslationStage::new(
                collaborators.translator.clone(),
                config.translation_batch_size,
                config.translation_batch_delay(),
                config.source_language.clone(),
                config.target_language.clone(),
            ),
            images: ImageStage::new(collaborators.images.clone(), config.add_image_delay()),
            persister: Persister::new(collaborators.cards.clone(), retry),
        }
    }

    /// Run one bulk add request to completion
    ///
    /// Returns `Err` only when the request fails validation, before any
    /// collaborator is called.
    pub async fn submit(
        &self,
        request: &BulkAddRequest,
        observer: &dyn ProgressObserver,
    ) -> Result<BulkAddResult, ValidationError> {
        let mut progress = ProgressReporter::new(observer);

        progress.enter(PipelineStage::Validating, request.words.len());
        let normalized = match validate_request(request, self.bounds) {
            Ok(normalized) => normalized,
            Err(e) => {
                tracing::info!(submitted = request.words.len(), error = %e, "Bulk add rejected");
                return Err(e);
            }
        };
        progress.advance(request.words.len());

        let total_words = normalized.words.len();
        let mut aggregator = ResultAggregator::new(total_words);

        tracing::info!(
            total_words,
            card_type = %normalized.card_type,
            attach_review_tag = request.attach_review_tag,
            "Starting bulk add"
        );

        // Duplicate check
        progress.enter(PipelineStage::CheckingDuplicates, total_words);
        let partition = match self.duplicates.check(&normalized.words).await {
            Ok(partition) => partition,
            Err(e) => {
                tracing::error!(error = %e, "Duplicate check failed, nothing will be created");
                let reason = format!("duplicate check failed: {}", e);
                for word in &normalized.words {
                    aggregator.record_omitted(word, FailureStage::Duplicate, &reason);
                }
                return Ok(aggregator.finish());
            }
        };
        progress.advance(total_words);

        let new_words = partition.new_words;
        aggregator.record_duplicates(partition.duplicates);

        if new_words.is_empty() {
            tracing::info!("Every submitted word already exists");
            return Ok(aggregator.finish());
        }

        // Review tag
        let review_tag = if request.attach_review_tag {
            match self.review_tag.ensure().await {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!(
                        tag = %self.review_tag.tag_name(),
                        error = %e,
                        "Review tag unavailable, continuing without it"
                    );
                    None
                }
            }
        } else {
            None
        };
        aggregator.set_review_tag_applied(review_tag.is_some());

        // Translation
        progress.enter(PipelineStage::Translating, new_words.len());
        let translations = self.translation.run(&new_words, &mut progress).await;
        for (word, outcome) in new_words.iter().zip(&translations) {
            aggregator.record_translation(word, outcome);
        }

        // Images: translation is the better prompt subject when available
        let subjects: Vec<String> = new_words
            .iter()
            .zip(&translations)
            .map(|(word, outcome)| {
                outcome
                    .value()
                    .filter(|t| !t.trim().is_empty())
                    .cloned()
                    .unwrap_or_else(|| word.clone())
            })
            .collect();

        progress.enter(PipelineStage::GeneratingImages, subjects.len());
        let images = self.images.run(&subjects, &mut progress).await;
        for (word, outcome) in new_words.iter().zip(&images) {
            aggregator.record_image(word, outcome);
        }

        // Persistence
        let template = CardTemplate::new(
            normalized.card_type,
            &request.tag_ids,
            review_tag,
            request.level_id.clone(),
        );
        let cards = build_cards(&new_words, &translations, &images, &template);

        progress.enter(PipelineStage::Persisting, cards.len());
        match self.persister.persist_batch(&cards).await {
            Ok(stored) => {
                // Only count records that answer one submitted card each
                let submitted: HashSet<Uuid> = cards.iter().map(|card| card.id).collect();
                let mut stored_ids = HashSet::new();
                let stored: Vec<_> = stored
                    .into_iter()
                    .filter(|card| submitted.contains(&card.id) && stored_ids.insert(card.id))
                    .collect();

                for card in cards.iter().filter(|card| !stored_ids.contains(&card.id)) {
                    aggregator.record_omitted(
                        &card.text,
                        FailureStage::Persist,
                        "card missing from store response",
                    );
                }

                progress.advance(stored.len());

                let tag_failures = self.persister.apply_tags(&stored).await;
                if tag_failures > 0 {
                    tracing::warn!(tag_failures, "Some cards were stored without their tags");
                }

                aggregator.record_created(stored);
            }
            Err(e) => {
                tracing::error!(
                    cards = cards.len(),
                    error = %e,
                    "Batch persistence failed, no cards created"
                );
                let reason = e.to_string();
                for card in &cards {
                    aggregator.record_omitted(&card.text, FailureStage::Persist, &reason);
                }
            }
        }

        let result = aggregator.finish();

        tracing::info!(
            total_words = result.total_words,
            cards_created = result.cards_created,
            duplicates_skipped = result.duplicates_skipped,
            translation_failures = result.translation_failures.len(),
            image_failures = result.image_failures.len(),
            persist_errors = result.persist_errors.len(),
            "Bulk add complete"
        );

        Ok(result)
    }
}
