//! Server-Sent Events (SSE) for ingestion progress streaming

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /events - SSE stream of every ingestion event
///
/// Streams:
/// - BulkAddStarted / BulkAddProgress / BulkAddCompleted / BulkAddRejected
/// - BackfillStarted / BackfillProgress / BackfillCompleted
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    vocab_common::sse::event_bus_sse_stream(&state.event_bus, "vocab-ingest")
}
