//! Image backfill API handlers
//!
//! POST /cards/backfill-images, GET /cards/backfill-images/:run_id,
//! POST /cards/backfill-images/:run_id/cancel

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use vocab_common::events::{BackfillState, IngestEvent, ProgressSnapshot};

use crate::{
    error::{ApiError, ApiResult},
    models::{BackfillFilter, BackfillSummary},
    pipeline::{eligible_cards, BackfillObserver, EventBusObserver, ProgressObserver},
    AppState,
};

/// Mutable view of one run, written by the pipeline observer
#[derive(Debug, Clone)]
pub struct RunStatus {
    pub state: BackfillState,
    pub progress: Option<ProgressSnapshot>,
    pub summary: Option<BackfillSummary>,
}

/// Finished runs kept for status lookups; older ones are dropped on the next start
pub const MAX_FINISHED_RUNS: usize = 16;

/// Registry entry for a backfill run
#[derive(Clone)]
pub struct BackfillRun {
    pub cancel_token: CancellationToken,
    pub started_at: DateTime<Utc>,
    pub eligible: usize,
    status: Arc<Mutex<RunStatus>>,
}

impl BackfillRun {
    fn new(eligible: usize) -> Self {
        Self {
            cancel_token: CancellationToken::new(),
            started_at: Utc::now(),
            eligible,
            status: Arc::new(Mutex::new(RunStatus {
                state: BackfillState::Running,
                progress: None,
                summary: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunStatus> {
        self.status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn status(&self) -> RunStatus {
        self.lock().clone()
    }
}

/// Drop the oldest finished runs beyond `MAX_FINISHED_RUNS`
fn prune_finished_runs(runs: &mut HashMap<Uuid, BackfillRun>) {
    let mut finished: Vec<(Uuid, DateTime<Utc>)> = runs
        .iter()
        .filter(|(_, run)| run.status().state.is_terminal())
        .map(|(id, run)| (*id, run.started_at))
        .collect();
    if finished.len() <= MAX_FINISHED_RUNS {
        return;
    }

    finished.sort_by_key(|(_, started_at)| std::cmp::Reverse(*started_at));
    for (run_id, _) in finished.drain(MAX_FINISHED_RUNS..) {
        runs.remove(&run_id);
        tracing::debug!(run_id = %run_id, "Pruned finished backfill run");
    }
}

/// Records progress in the registry and forwards everything to the EventBus
struct RunObserver {
    run: BackfillRun,
    events: EventBusObserver,
}

impl ProgressObserver for RunObserver {
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self.run.lock().progress = Some(snapshot.clone());
        self.events.on_progress(snapshot);
    }
}

impl BackfillObserver for RunObserver {
    fn on_complete(&self, summary: &BackfillSummary) {
        {
            let mut status = self.run.lock();
            status.state = summary.state;
            status.summary = Some(summary.clone());
        }
        self.events.on_complete(summary);
    }
}

/// POST /cards/backfill-images response
#[derive(Debug, Serialize)]
pub struct StartBackfillResponse {
    pub run_id: Uuid,
    pub state: BackfillState,
    pub eligible: usize,
    pub started_at: DateTime<Utc>,
}

/// GET /cards/backfill-images/:run_id response
#[derive(Debug, Serialize)]
pub struct BackfillStatusResponse {
    pub run_id: Uuid,
    pub state: BackfillState,
    pub eligible: usize,
    pub progress: Option<ProgressSnapshot>,
    pub summary: Option<BackfillSummary>,
    pub started_at: DateTime<Utc>,
}

/// POST /cards/backfill-images/:run_id/cancel response
#[derive(Debug, Serialize)]
pub struct CancelBackfillResponse {
    pub run_id: Uuid,
    pub state: BackfillState,
    pub cancel_requested: bool,
}

/// POST /cards/backfill-images
///
/// Start a background backfill over the stored cards matching the filter.
/// Returns 202 Accepted with the run id; 409 if another run is active.
pub async fn start_backfill(
    State(state): State<AppState>,
    Json(filter): Json<BackfillFilter>,
) -> ApiResult<(StatusCode, Json<StartBackfillResponse>)> {
    let cards = state
        .retry
        .run("load cards for backfill", || state.cards.load_all())
        .await?;
    let eligible = eligible_cards(&cards, &filter).len();

    let run_id = Uuid::new_v4();
    let run = BackfillRun::new(eligible);
    {
        let mut runs = state.backfill_runs.write().await;
        if runs.values().any(|r| !r.status().state.is_terminal()) {
            return Err(ApiError::Conflict(
                "Image backfill already running".to_string(),
            ));
        }
        prune_finished_runs(&mut runs);
        runs.insert(run_id, run.clone());
    }

    state.event_bus.emit_lossy(IngestEvent::BackfillStarted {
        run_id,
        eligible,
        timestamp: Utc::now(),
    });

    tracing::info!(run_id = %run_id, eligible, filter = ?filter, "Image backfill started");

    let response = StartBackfillResponse {
        run_id,
        state: BackfillState::Running,
        eligible,
        started_at: run.started_at,
    };

    let pipeline = state.backfill.clone();
    let observer = RunObserver {
        run: run.clone(),
        events: EventBusObserver::backfill(state.event_bus.clone(), run_id),
    };
    tokio::spawn(async move {
        pipeline
            .run(&cards, &filter, &observer, &run.cancel_token)
            .await;
        tracing::info!(run_id = %run_id, "Background backfill task finished");
    });

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// GET /cards/backfill-images/:run_id
pub async fn get_backfill_status(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> ApiResult<Json<BackfillStatusResponse>> {
    let run = state
        .backfill_runs
        .read()
        .await
        .get(&run_id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("Backfill run not found: {}", run_id)))?;

    let status = run.status();

    Ok(Json(BackfillStatusResponse {
        run_id,
        state: status.state,
        eligible: run.eligible,
        progress: status.progress,
        summary: status.summary,
        started_at: run.started_at,
    }))
}

/// POST /cards/backfill-images/:run_id/cancel
///
/// Sets the run's cancellation token. The item in flight finishes; the run
/// reports `cancelled` once it stops.
pub async fn cancel_backfill(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> ApiResult<Json<CancelBackfillResponse>> {
    let run = state
        .backfill_runs
        .read()
        .await
        .get(&run_id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("Backfill run not found: {}", run_id)))?;

    let current = run.status().state;
    if current.is_terminal() {
        return Err(ApiError::BadRequest(format!(
            "Backfill run already finished: {:?}",
            current
        )));
    }

    run.cancel_token.cancel();
    tracing::info!(run_id = %run_id, "Backfill cancellation requested");

    Ok(Json(CancelBackfillResponse {
        run_id,
        state: current,
        cancel_requested: true,
    }))
}

/// Build backfill routes
pub fn backfill_routes() -> Router<AppState> {
    Router::new()
        .route("/cards/backfill-images", post(start_backfill))
        .route("/cards/backfill-images/:run_id", get(get_backfill_status))
        .route("/cards/backfill-images/:run_id/cancel", post(cancel_backfill))
}
