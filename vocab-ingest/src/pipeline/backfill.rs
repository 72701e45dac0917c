//! Image backfill pipeline
//!
//! # State Progression
//! IDLE → RUNNING → (COMPLETED | CANCELLED)
//!
//! Walks the eligible cards one at a time: generate an image, store the card,
//! pause. Cancellation is checked before each item, so a request already in
//! flight always finishes and its result is kept.

use tokio_util::sync::CancellationToken;
use vocab_common::config::PipelineConfig;
use vocab_common::events::{BackfillState, PipelineStage, ProgressSnapshot};

use super::images::ImageStage;
use super::persister::Persister;
use super::progress::BackfillObserver;
use super::Collaborators;
use crate::models::{BackfillFilter, BackfillSummary, Card, Failure, FailureStage, Outcome};
use crate::utils::RetryPolicy;

/// Cards a backfill run with `filter` would visit, in store order
pub fn eligible_cards(cards: &[Card], filter: &BackfillFilter) -> Vec<Card> {
    cards
        .iter()
        .filter(|card| filter.is_eligible(card))
        .cloned()
        .collect()
}

pub struct BackfillPipeline {
    images: ImageStage,
    persister: Persister,
}

impl BackfillPipeline {
    pub fn new(collaborators: &Collaborators, config: &PipelineConfig, retry: RetryPolicy) -> Self {
        Self {
            images: ImageStage::new(collaborators.images.clone(), config.backfill_image_delay()),
            persister: Persister::new(collaborators.cards.clone(), retry),
        }
    }

    /// Run one backfill over `cards`
    ///
    /// The eligible set is fixed up front. The summary is delivered through
    /// `observer.on_complete` exactly once.
    pub async fn run(
        &self,
        cards: &[Card],
        filter: &BackfillFilter,
        observer: &dyn BackfillObserver,
        cancel_token: &CancellationToken,
    ) {
        let mut state = BackfillState::Idle;
        let eligible = eligible_cards(cards, filter);
        let total = eligible.len();

        state = transition(state, BackfillState::Running);
        tracing::info!(total, considered = cards.len(), "Starting image backfill");

        let mut completed = 0;
        let mut failures: Vec<Failure> = Vec::new();
        let mut processed = 0;
        let mut cancelled = false;

        for (index, card) in eligible.iter().enumerate() {
            if cancel_token.is_cancelled() {
                tracing::info!(processed, total, "Image backfill cancelled");
                cancelled = true;
                break;
            }

            observer.on_progress(
                &ProgressSnapshot::new(PipelineStage::GeneratingImages, index, total)
                    .with_item(card.text.clone()),
            );

            let item_key = card.id.to_string();
            let subject = card.prompt_subject().unwrap_or(card.text.as_str());

            match self.images.generate_one(subject).await {
                Outcome::Success { value: url } => {
                    match self.persister.persist_image(card, url).await {
                        Ok(_) => {
                            completed += 1;
                            tracing::debug!(card_id = %card.id, text = %card.text, "Card image stored");
                        }
                        Err(e) => {
                            tracing::warn!(card_id = %card.id, error = %e, "Failed to store card image");
                            failures.push(Failure::new(item_key, FailureStage::Persist, e.to_string()));
                        }
                    }
                }
                Outcome::Failure { reason } => {
                    failures.push(Failure::new(item_key, FailureStage::Image, reason));
                }
            }
            processed = index + 1;

            if processed < total {
                self.images.pause(Some(cancel_token)).await;
            }
        }

        if processed > 0 {
            observer.on_progress(&ProgressSnapshot::new(
                PipelineStage::GeneratingImages,
                processed,
                total,
            ));
        }

        state = transition(
            state,
            if cancelled {
                BackfillState::Cancelled
            } else {
                BackfillState::Completed
            },
        );

        let summary = BackfillSummary {
            completed,
            failed: failures.len(),
            total,
            failures,
            cancelled,
            state,
        };

        tracing::info!(
            completed = summary.completed,
            failed = summary.failed,
            total = summary.total,
            cancelled = summary.cancelled,
            "Image backfill finished"
        );

        observer.on_complete(&summary);
    }
}

fn transition(from: BackfillState, to: BackfillState) -> BackfillState {
    tracing::debug!(from = ?from, to = ?to, "Backfill state transition");
    to
}
