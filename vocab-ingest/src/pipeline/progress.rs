//! Progress reporting and result aggregation
//!
//! Observers are plain synchronous callbacks invoked at checkpoints. The
//! pipelines never block on them; the EventBus adapter forwards snapshots to
//! SSE subscribers without waiting.

use chrono::Utc;
use uuid::Uuid;
use vocab_common::events::{EventBus, IngestEvent, PipelineStage, ProgressSnapshot};

use crate::models::{
    BackfillSummary, BulkAddResult, Card, Failure, FailureStage, ImageOutcome, TranslationOutcome,
};

/// Receives progress snapshots from a running pipeline
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, snapshot: &ProgressSnapshot);
}

/// Progress observer that also receives the backfill summary
pub trait BackfillObserver: ProgressObserver {
    fn on_complete(&self, summary: &BackfillSummary);
}

/// Observer that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _snapshot: &ProgressSnapshot) {}
}

impl BackfillObserver for NoopObserver {
    fn on_complete(&self, _summary: &BackfillSummary) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunKind {
    BulkAdd,
    Backfill,
}

/// Forwards snapshots and backfill summaries to the EventBus
#[derive(Clone)]
pub struct EventBusObserver {
    event_bus: EventBus,
    run_id: Uuid,
    kind: RunKind,
}

impl EventBusObserver {
    pub fn bulk_add(event_bus: EventBus, run_id: Uuid) -> Self {
        Self {
            event_bus,
            run_id,
            kind: RunKind::BulkAdd,
        }
    }

    pub fn backfill(event_bus: EventBus, run_id: Uuid) -> Self {
        Self {
            event_bus,
            run_id,
            kind: RunKind::Backfill,
        }
    }
}

impl ProgressObserver for EventBusObserver {
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        let event = match self.kind {
            RunKind::BulkAdd => IngestEvent::BulkAddProgress {
                run_id: self.run_id,
                snapshot: snapshot.clone(),
                timestamp: Utc::now(),
            },
            RunKind::Backfill => IngestEvent::BackfillProgress {
                run_id: self.run_id,
                snapshot: snapshot.clone(),
                timestamp: Utc::now(),
            },
        };
        self.event_bus.emit_lossy(event);
    }
}

impl BackfillObserver for EventBusObserver {
    fn on_complete(&self, summary: &BackfillSummary) {
        self.event_bus.emit_lossy(IngestEvent::BackfillCompleted {
            run_id: self.run_id,
            state: summary.state,
            completed: summary.completed,
            failed: summary.failed,
            total: summary.total,
            timestamp: Utc::now(),
        });
    }
}

/// Emits snapshots in pipeline stage order
///
/// Stages only move forward. `current` never decreases within a stage and is
/// clamped to the stage total. Stages with no work are not announced.
pub struct ProgressReporter<'a> {
    observer: &'a dyn ProgressObserver,
    stage: Option<PipelineStage>,
    current: usize,
    total: usize,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(observer: &'a dyn ProgressObserver) -> Self {
        Self {
            observer,
            stage: None,
            current: 0,
            total: 0,
        }
    }

    /// Enter `stage` with `total` units of work and emit the entry snapshot.
    ///
    /// Returns false (and emits nothing) when the stage has no work or would
    /// move backwards.
    pub fn enter(&mut self, stage: PipelineStage, total: usize) -> bool {
        if let Some(previous) = self.stage {
            if stage <= previous {
                tracing::warn!(
                    previous = %previous,
                    requested = %stage,
                    "Ignoring out-of-order progress stage"
                );
                return false;
            }
        }
        if total == 0 {
            tracing::debug!(stage = %stage, "Skipping stage with no work");
            return false;
        }

        self.stage = Some(stage);
        self.current = 0;
        self.total = total;
        self.observer
            .on_progress(&ProgressSnapshot::new(stage, 0, total));
        true
    }

    /// Report `current` finished units in the active stage
    pub fn advance(&mut self, current: usize) {
        self.emit(current, None);
    }

    /// Report progress naming the item being worked on
    pub fn advance_with_item(&mut self, current: usize, item: &str) {
        self.emit(current, Some(item));
    }

    fn emit(&mut self, current: usize, item: Option<&str>) {
        let Some(stage) = self.stage else {
            return;
        };
        self.current = current.clamp(self.current, self.total);

        let mut snapshot = ProgressSnapshot::new(stage, self.current, self.total);
        if let Some(item) = item {
            snapshot = snapshot.with_item(item);
        }
        self.observer.on_progress(&snapshot);
    }
}

/// Accumulates per-item outcomes of a bulk add run into a `BulkAddResult`
#[derive(Debug, Default)]
pub struct ResultAggregator {
    result: BulkAddResult,
}

impl ResultAggregator {
    pub fn new(total_words: usize) -> Self {
        Self {
            result: BulkAddResult {
                total_words,
                ..Default::default()
            },
        }
    }

    pub fn record_duplicates(&mut self, words: Vec<String>) {
        self.result.duplicates_skipped += words.len();
        self.result.duplicate_words.extend(words);
    }

    pub fn record_translation(&mut self, word: &str, outcome: &TranslationOutcome) {
        if let Some(reason) = outcome.reason() {
            self.result
                .translation_failures
                .push(Failure::new(word, FailureStage::Translate, reason));
        }
    }

    pub fn record_image(&mut self, word: &str, outcome: &ImageOutcome) {
        if let Some(reason) = outcome.reason() {
            self.result
                .image_failures
                .push(Failure::new(word, FailureStage::Image, reason));
        }
    }

    /// Word that will not be stored
    pub fn record_omitted(&mut self, word: &str, stage: FailureStage, reason: &str) {
        self.result
            .persist_errors
            .push(Failure::new(word, stage, reason));
    }

    pub fn record_created(&mut self, cards: Vec<Card>) {
        self.result.cards_created += cards.len();
        self.result.created_cards.extend(cards);
    }

    pub fn set_review_tag_applied(&mut self, applied: bool) {
        self.result.review_tag_applied = applied;
    }

    pub fn finish(self) -> BulkAddResult {
        if !self.result.is_reconciled() {
            tracing::error!(
                total_words = self.result.total_words,
                cards_created = self.result.cards_created,
                duplicates_skipped = self.result.duplicates_skipped,
                persist_errors = self.result.persist_errors.len(),
                "Bulk add result does not reconcile"
            );
        }
        debug_assert!(self.result.is_reconciled());
        self.result
    }
}
