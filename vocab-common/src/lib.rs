//! # Vocab Common Library
//!
//! Shared code for the vocabulary services including:
//! - Error types
//! - Event types (IngestEvent enum) and the broadcast EventBus
//! - Configuration loading and root folder resolution
//! - SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
