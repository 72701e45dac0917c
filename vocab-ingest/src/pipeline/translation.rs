//! Batched translation stage
//!
//! Words are translated in fixed-size batches. Requests within a batch run
//! concurrently; the next batch starts only after the whole batch settled and
//! a short pause elapsed. Every word gets an outcome in its own slot, in input
//! order.

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;

use super::progress::ProgressReporter;
use crate::models::{Outcome, TranslationOutcome};
use crate::types::Translator;

pub struct TranslationStage {
    translator: Arc<dyn Translator>,
    batch_size: usize,
    batch_delay: Duration,
    source_language: String,
    target_language: String,
}

impl TranslationStage {
    pub fn new(
        translator: Arc<dyn Translator>,
        batch_size: usize,
        batch_delay: Duration,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            translator,
            batch_size: batch_size.max(1),
            batch_delay,
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }

    pub async fn run(
        &self,
        words: &[String],
        progress: &mut ProgressReporter<'_>,
    ) -> Vec<TranslationOutcome> {
        let mut slots: Vec<Option<TranslationOutcome>> = vec![None; words.len()];
        let mut settled = 0;

        for (batch_index, batch) in words.chunks(self.batch_size).enumerate() {
            if batch_index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            let offset = batch_index * self.batch_size;
            let mut in_flight: FuturesUnordered<_> = batch
                .iter()
                .enumerate()
                .map(|(i, word)| async move {
                    let result = self
                        .translator
                        .translate(word, &self.source_language, &self.target_language)
                        .await;
                    (offset + i, result)
                })
                .collect();

            while let Some((slot, result)) = in_flight.next().await {
                let word = &words[slot];
                match &result {
                    Ok(translation) => {
                        tracing::debug!(word = %word, translation = %translation, "Translated")
                    }
                    Err(e) => tracing::warn!(word = %word, error = %e, "Translation failed"),
                }

                slots[slot] = Some(result.into());
                settled += 1;
                progress.advance_with_item(settled, word);
            }
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Outcome::failure("translation not attempted")))
            .collect()
    }
}
