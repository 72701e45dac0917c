//! Collaborator trait definitions
//!
//! The pipelines never talk to storage or remote services directly. They go
//! through these four traits so that the SQLite store and HTTP clients can be
//! swapped for in-memory fakes.
//!
//! Every method returns `RemoteError` on failure. Whether a failure is worth
//! retrying is decided by `RemoteError::is_transient`, not by the implementor.
//!
//! # Example
//! ```rust,ignore
//! use vocab_ingest::types::Translator;
//!
//! pub struct EchoTranslator;
//!
//! #[async_trait::async_trait]
//! impl Translator for EchoTranslator {
//!     async fn translate(&self, text: &str, _from: &str, _to: &str) -> Result<String, RemoteError> {
//!         Ok(text.to_uppercase())
//!     }
//! }
//! ```

use uuid::Uuid;

use crate::error::RemoteError;
use crate::models::{Card, Tag};

/// Card persistence
#[async_trait::async_trait]
pub trait CardStore: Send + Sync {
    /// Every stored card, used as the duplicate check snapshot
    async fn load_all(&self) -> Result<Vec<Card>, RemoteError>;

    /// Insert or update all cards as one unit of work. Returns the stored
    /// records; a shorter result means some cards were not stored.
    async fn batch_upsert(&self, cards: &[Card]) -> Result<Vec<Card>, RemoteError>;

    /// Insert or update a single card
    async fn upsert_one(&self, card: &Card) -> Result<Card, RemoteError>;

    /// Replace the tag set of one card
    async fn set_tag_associations(&self, card_id: Uuid, tag_ids: &[Uuid])
        -> Result<(), RemoteError>;
}

/// Category tag persistence
#[async_trait::async_trait]
pub trait TagStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Tag>, RemoteError>;

    async fn create(&self, name: &str, description: &str) -> Result<Tag, RemoteError>;
}

/// Text translation service
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, RemoteError>;
}

/// Image generation service
#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image for `prompt`, returning its URL
    async fn generate(&self, prompt: &str) -> Result<String, RemoteError>;
}
