//! Test Helper Utilities
//!
//! Shared utilities for testing vocab-ingest

#![allow(dead_code)]

pub mod fakes;
pub mod log_capture;

pub use fakes::{
    FakeImageGenerator, FakeTranslator, Harness, MemoryCardStore, MemoryTagStore,
    RecordingObserver,
};
pub use log_capture::{init_test_logging, LogCapture};

use std::time::Duration;
use vocab_common::config::PipelineConfig;
use vocab_ingest::models::BulkAddRequest;
use vocab_ingest::utils::RetryPolicy;

/// Pipeline settings with every pacing delay removed
pub fn unpaced_config() -> PipelineConfig {
    PipelineConfig {
        translation_batch_delay_ms: 0,
        add_image_delay_ms: 0,
        backfill_image_delay_ms: 0,
        ..PipelineConfig::default()
    }
}

/// Retry policy with millisecond backoff so failing tests stay fast
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(
        3,
        Duration::from_millis(1),
        Duration::from_millis(10),
        2.0,
    )
}

/// Bulk add request for `words` with card type "word"
pub fn word_request(words: &[&str]) -> BulkAddRequest {
    BulkAddRequest::new(words.iter().map(|w| w.to_string()).collect(), "word")
}
