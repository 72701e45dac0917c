//! Data models for vocab-ingest
//!
//! - Stored entities (cards, tags) and the backfill filter
//! - Per-item outcomes and failure records
//! - Run requests and summaries

pub mod backfill;
pub mod bulk_add;
pub mod card;
pub mod outcome;

pub use backfill::BackfillSummary;
pub use bulk_add::{BulkAddRequest, BulkAddResult};
pub use card::{BackfillFilter, Card, CardType, Tag};
pub use outcome::{Failure, FailureStage, ImageOutcome, Outcome, TranslationOutcome};
