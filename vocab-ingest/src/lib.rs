//! vocab-ingest library interface
//!
//! Bulk vocabulary ingestion: words in, translated and illustrated cards out.
//! Exposes the pipelines and the HTTP router for integration testing.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod types;
pub mod utils;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;
use vocab_common::config::PipelineConfig;
use vocab_common::events::EventBus;

use crate::api::BackfillRun;
use crate::pipeline::{BackfillPipeline, BulkAddPipeline, Collaborators};
use crate::types::CardStore;
use crate::utils::RetryPolicy;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Card store, used directly to snapshot cards for backfill runs
    pub cards: Arc<dyn CardStore>,
    pub bulk_add: Arc<BulkAddPipeline>,
    pub backfill: Arc<BackfillPipeline>,
    /// Retry policy for store calls made by handlers
    pub retry: RetryPolicy,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Backfill runs with their cancellation tokens
    pub backfill_runs: Arc<RwLock<HashMap<Uuid, BackfillRun>>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        collaborators: Collaborators,
        config: &PipelineConfig,
        retry: RetryPolicy,
        event_bus: EventBus,
    ) -> Self {
        Self {
            cards: collaborators.cards.clone(),
            bulk_add: Arc::new(BulkAddPipeline::new(&collaborators, config, retry.clone())),
            backfill: Arc::new(BackfillPipeline::new(&collaborators, config, retry.clone())),
            retry,
            event_bus,
            backfill_runs: Arc::new(RwLock::new(HashMap::new())),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Remember `message` for the health endpoint
    pub async fn record_error(&self, message: String) {
        tracing::warn!(error = %message, "Recording last error");
        *self.last_error.write().await = Some(message);
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::card_routes())
        .merge(api::backfill_routes())
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
