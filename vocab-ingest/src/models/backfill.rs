//! Image backfill summary

use serde::{Deserialize, Serialize};
use vocab_common::events::BackfillState;

use super::Failure;

/// Final report of a backfill run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackfillSummary {
    /// Cards that received and stored a new image
    pub completed: usize,
    pub failed: usize,
    /// Size of the eligible set computed at start
    pub total: usize,
    pub failures: Vec<Failure>,
    /// Run stopped early because the token was set
    pub cancelled: bool,
    pub state: BackfillState,
}

impl BackfillSummary {
    /// Eligible cards never visited because the run was cancelled
    pub fn skipped(&self) -> usize {
        self.total.saturating_sub(self.completed + self.failed)
    }
}
