//! Bulk add API handler
//!
//! POST /cards/bulk

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;
use vocab_common::events::IngestEvent;

use crate::{
    error::ApiResult,
    models::{BulkAddRequest, BulkAddResult},
    pipeline::EventBusObserver,
    AppState,
};

/// POST /cards/bulk response
#[derive(Debug, Serialize)]
pub struct BulkAddResponse {
    /// Id tagging this run's SSE progress events
    pub run_id: Uuid,
    #[serde(flatten)]
    pub result: BulkAddResult,
}

/// POST /cards/bulk
///
/// Runs the add pipeline to completion. Progress is streamed on /events
/// while the request is open. Returns 400 when the request fails validation.
pub async fn bulk_add(
    State(state): State<AppState>,
    Json(request): Json<BulkAddRequest>,
) -> ApiResult<Json<BulkAddResponse>> {
    let run_id = Uuid::new_v4();

    tracing::info!(
        run_id = %run_id,
        submitted = request.words.len(),
        card_type = %request.card_type,
        "Bulk add requested"
    );

    state.event_bus.emit_lossy(IngestEvent::BulkAddStarted {
        run_id,
        submitted_words: request.words.len(),
        timestamp: Utc::now(),
    });

    let observer = EventBusObserver::bulk_add(state.event_bus.clone(), run_id);

    match state.bulk_add.submit(&request, &observer).await {
        Ok(result) => {
            state.event_bus.emit_lossy(IngestEvent::BulkAddCompleted {
                run_id,
                total_words: result.total_words,
                cards_created: result.cards_created,
                duplicates_skipped: result.duplicates_skipped,
                failure_count: result.failure_count(),
                timestamp: Utc::now(),
            });

            if let Some(failure) = result.persist_errors.first() {
                state
                    .record_error(format!(
                        "Bulk add {} stored {} of {} new cards: {}",
                        run_id,
                        result.cards_created,
                        result.cards_created + result.persist_errors.len(),
                        failure.reason
                    ))
                    .await;
            }

            Ok(Json(BulkAddResponse { run_id, result }))
        }
        Err(e) => {
            state.event_bus.emit_lossy(IngestEvent::BulkAddRejected {
                run_id,
                reason: e.to_string(),
                timestamp: Utc::now(),
            });
            Err(e.into())
        }
    }
}

/// Build card routes
pub fn card_routes() -> Router<AppState> {
    Router::new().route("/cards/bulk", post(bulk_add))
}
