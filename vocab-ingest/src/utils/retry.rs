//! Remote call retry logic
//!
//! Exponential backoff for transient collaborator failures. Wraps every
//! persistence and category call made by the pipelines; translation and image
//! requests are not retried.

use std::time::{Duration, Instant};
use vocab_common::config::RetryConfig;

use crate::error::RemoteError;

/// Retry classifier signature
pub type RetryClassifier = fn(&RemoteError) -> bool;

fn default_classifier(err: &RemoteError) -> bool {
    err.is_transient()
}

/// Exponential backoff policy
///
/// **Algorithm:**
/// 1. Attempt operation
/// 2. If successful, return result
/// 3. If the classifier marks the error transient and retries remain:
///    log WARN, sleep `min(initial_delay * multiplier^attempt, max_delay)`
///    (attempt counted from 0), retry
/// 4. Otherwise return the last error
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    should_retry: RetryClassifier,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            backoff_multiplier,
            should_retry: default_classifier,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.backoff_multiplier,
        )
    }

    /// Replace the transient-failure classifier
    pub fn with_classifier(mut self, should_retry: RetryClassifier) -> Self {
        self.should_retry = should_retry;
        self
    }

    pub fn should_retry(&self, err: &RemoteError) -> bool {
        (self.should_retry)(err)
    }

    /// Backoff before retry number `attempt + 1`, capped at `max_delay`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        let secs = self.initial_delay.as_secs_f64() * factor;

        if !secs.is_finite() || secs < 0.0 || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Run `operation` under this policy
    ///
    /// # Arguments
    /// * `operation_name` - Name for logging (e.g., "batch card upsert")
    /// * `operation` - Closure producing a fresh future per attempt
    pub async fn run<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, RemoteError>>,
    {
        let start_time = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        tracing::debug!(
                            operation = operation_name,
                            attempts = attempt + 1,
                            elapsed_ms = start_time.elapsed().as_millis() as u64,
                            "Remote operation succeeded after retry"
                        );
                    }
                    return Ok(result);
                }
                Err(err) => {
                    if !self.should_retry(&err) {
                        tracing::debug!(
                            operation = operation_name,
                            error = %err,
                            "Remote operation failed with permanent error"
                        );
                        return Err(err);
                    }

                    if attempt >= self.max_retries {
                        tracing::error!(
                            operation = operation_name,
                            attempts = attempt + 1,
                            elapsed_ms = start_time.elapsed().as_millis() as u64,
                            error = %err,
                            "Remote operation failed: retries exhausted"
                        );
                        return Err(err);
                    }

                    let backoff = self.delay_for_attempt(attempt);

                    tracing::warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Transient failure, will retry after backoff"
                    );

                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}
