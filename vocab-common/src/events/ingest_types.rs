//! Ingestion progress type definitions
//!
//! Supporting types for bulk add and image backfill progress tracking.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage, in the fixed order a bulk add run walks through them
///
/// The derived ordering follows declaration order, so `a < b` means stage
/// `a` runs before stage `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStage {
    /// Input normalization and bounds check
    Validating,
    /// Loading stored cards and partitioning the input
    CheckingDuplicates,
    /// Batched translation requests
    Translating,
    /// Sequential image generation requests
    GeneratingImages,
    /// Writing card records
    Persisting,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Validating => "validating",
            PipelineStage::CheckingDuplicates => "checking-duplicates",
            PipelineStage::Translating => "translating",
            PipelineStage::GeneratingImages => "generating-images",
            PipelineStage::Persisting => "persisting",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time progress of a running pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Stage currently executing
    pub stage: PipelineStage,
    /// Units of work finished within the stage
    pub current: usize,
    /// Units of work the stage will process
    pub total: usize,
    /// Item being worked on, when the stage processes one item at a time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
}

impl ProgressSnapshot {
    pub fn new(stage: PipelineStage, current: usize, total: usize) -> Self {
        Self {
            stage,
            current,
            total,
            item: None,
        }
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    /// Percentage complete (0.0 - 100.0)
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f64 / self.total as f64) * 100.0
        }
    }
}

/// Lifecycle of an image backfill run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackfillState {
    /// Created, not yet started
    Idle,
    /// Processing eligible cards
    Running,
    /// Every eligible card was processed
    Completed,
    /// Stopped early by the cancellation token
    Cancelled,
}

impl BackfillState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BackfillState::Completed | BackfillState::Cancelled)
    }
}
