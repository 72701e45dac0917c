//! Utility modules for vocab-ingest

pub mod retry;

pub use retry::RetryPolicy;
