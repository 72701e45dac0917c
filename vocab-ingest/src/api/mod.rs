//! HTTP API handlers for vocab-ingest
//!
//! REST endpoints for bulk add and image backfill, plus an SSE stream of
//! progress events.

pub mod backfill;
pub mod cards;
pub mod health;
pub mod sse;

pub use backfill::{backfill_routes, BackfillRun, MAX_FINISHED_RUNS};
pub use cards::card_routes;
pub use health::health_routes;
pub use sse::event_stream;
