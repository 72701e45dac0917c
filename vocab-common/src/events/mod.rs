//! Event system for the vocabulary services
//!
//! Provides shared event definitions and the broadcast EventBus.

mod ingest_types;

pub use ingest_types::{BackfillState, PipelineStage, ProgressSnapshot};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Ingestion event types
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IngestEvent {
    /// Bulk add run accepted
    BulkAddStarted {
        run_id: Uuid,
        /// Raw word count before normalization
        submitted_words: usize,
        timestamp: DateTime<Utc>,
    },

    /// Bulk add stage progress
    BulkAddProgress {
        run_id: Uuid,
        snapshot: ProgressSnapshot,
        timestamp: DateTime<Utc>,
    },

    /// Bulk add run finished (successfully or with recorded failures)
    BulkAddCompleted {
        run_id: Uuid,
        total_words: usize,
        cards_created: usize,
        duplicates_skipped: usize,
        /// Translation + image + persistence failures
        failure_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Bulk add request rejected before any side effect
    BulkAddRejected {
        run_id: Uuid,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Image backfill run started with a fixed eligible set
    BackfillStarted {
        run_id: Uuid,
        eligible: usize,
        timestamp: DateTime<Utc>,
    },

    /// Image backfill per-item progress
    BackfillProgress {
        run_id: Uuid,
        snapshot: ProgressSnapshot,
        timestamp: DateTime<Utc>,
    },

    /// Image backfill run reached a terminal state
    BackfillCompleted {
        run_id: Uuid,
        state: BackfillState,
        completed: usize,
        failed: usize,
        total: usize,
        timestamp: DateTime<Utc>,
    },
}

impl IngestEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            IngestEvent::BulkAddStarted { .. } => "BulkAddStarted",
            IngestEvent::BulkAddProgress { .. } => "BulkAddProgress",
            IngestEvent::BulkAddCompleted { .. } => "BulkAddCompleted",
            IngestEvent::BulkAddRejected { .. } => "BulkAddRejected",
            IngestEvent::BackfillStarted { .. } => "BackfillStarted",
            IngestEvent::BackfillProgress { .. } => "BackfillProgress",
            IngestEvent::BackfillCompleted { .. } => "BackfillCompleted",
        }
    }

    /// Run the event belongs to
    pub fn run_id(&self) -> Uuid {
        match self {
            IngestEvent::BulkAddStarted { run_id, .. }
            | IngestEvent::BulkAddProgress { run_id, .. }
            | IngestEvent::BulkAddCompleted { run_id, .. }
            | IngestEvent::BulkAddRejected { run_id, .. }
            | IngestEvent::BackfillStarted { run_id, .. }
            | IngestEvent::BackfillProgress { run_id, .. }
            | IngestEvent::BackfillCompleted { run_id, .. } => *run_id,
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use vocab_common::events::{EventBus, IngestEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(IngestEvent::BackfillStarted {
///     run_id: uuid::Uuid::new_v4(),
///     eligible: 3,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<IngestEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<IngestEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: IngestEvent,
    ) -> Result<usize, broadcast::error::SendError<IngestEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Progress updates are fine to drop when nobody is watching.
    pub fn emit_lossy(&self, event: IngestEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
