//! Sequential image generation stage
//!
//! The image provider is single-flight: one request at a time with a fixed
//! pause between requests. The pause is skipped after the last item.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::progress::ProgressReporter;
use crate::models::{ImageOutcome, Outcome};
use crate::types::ImageGenerator;

/// Prompt sent to the image provider for one card
pub fn build_prompt(subject: &str) -> String {
    format!(
        "A simple, friendly illustration representing \"{}\". \
         Plain background, no text or letters in the image.",
        subject.trim()
    )
}

pub struct ImageStage {
    generator: Arc<dyn ImageGenerator>,
    delay: Duration,
}

impl ImageStage {
    pub fn new(generator: Arc<dyn ImageGenerator>, delay: Duration) -> Self {
        Self { generator, delay }
    }

    /// One request for one subject
    pub async fn generate_one(&self, subject: &str) -> ImageOutcome {
        match self.generator.generate(&build_prompt(subject)).await {
            Ok(url) if url.trim().is_empty() => {
                tracing::warn!(subject = %subject, "Image provider returned an empty URL");
                Outcome::failure("image provider returned an empty URL")
            }
            Ok(url) => {
                tracing::debug!(subject = %subject, url = %url, "Image generated");
                Outcome::success(url)
            }
            Err(e) => {
                tracing::warn!(subject = %subject, error = %e, "Image generation failed");
                Outcome::failure(e.to_string())
            }
        }
    }

    /// Generate images for `subjects` in order, one at a time
    pub async fn run(
        &self,
        subjects: &[String],
        progress: &mut ProgressReporter<'_>,
    ) -> Vec<ImageOutcome> {
        let mut outcomes = Vec::with_capacity(subjects.len());

        for (index, subject) in subjects.iter().enumerate() {
            outcomes.push(self.generate_one(subject).await);
            progress.advance_with_item(index + 1, subject);

            if index + 1 < subjects.len() {
                self.pause(None).await;
            }
        }

        outcomes
    }

    /// Pacing pause between two requests, cut short when `cancel` fires
    pub async fn pause(&self, cancel: Option<&CancellationToken>) {
        if self.delay.is_zero() {
            return;
        }
        match cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }
            None => tokio::time::sleep(self.delay).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_subject() {
        let prompt = build_prompt("  apple ");
        assert!(prompt.contains("\"apple\""));
        assert!(prompt.contains("no text"));
    }
}
