//! Ingestion pipelines
//!
//! Two entry points share the stage building blocks:
//!
//! - [`BulkAddPipeline`]: normalize → duplicate check → review tag →
//!   batched translation → sequential images → one batch upsert
//! - [`BackfillPipeline`]: filter → sequential cancellable images →
//!   per-card upsert

pub mod backfill;
pub mod bulk_add;
pub mod duplicates;
pub mod images;
pub mod normalizer;
pub mod persister;
pub mod progress;
pub mod tags;
pub mod translation;

pub use backfill::{eligible_cards, BackfillPipeline};
pub use bulk_add::BulkAddPipeline;
pub use progress::{BackfillObserver, EventBusObserver, NoopObserver, ProgressObserver};

use std::sync::Arc;

use crate::types::{CardStore, ImageGenerator, TagStore, Translator};

/// External collaborators both pipelines are built from
#[derive(Clone)]
pub struct Collaborators {
    pub cards: Arc<dyn CardStore>,
    pub tags: Arc<dyn TagStore>,
    pub translator: Arc<dyn Translator>,
    pub images: Arc<dyn ImageGenerator>,
}
