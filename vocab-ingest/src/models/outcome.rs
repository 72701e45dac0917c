//! Per-item stage outcomes and failure records

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RemoteError;

/// Result of one external call for one item: a value or a reason, never both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome<T> {
    Success { value: T },
    Failure { reason: String },
}

impl<T> Outcome<T> {
    pub fn success(value: T) -> Self {
        Outcome::Success { value }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Outcome::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success { value } => Some(value),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { reason } => Some(reason),
        }
    }
}

impl<T> From<Result<T, RemoteError>> for Outcome<T> {
    fn from(result: Result<T, RemoteError>) -> Self {
        match result {
            Ok(value) => Outcome::success(value),
            Err(err) => Outcome::failure(err.to_string()),
        }
    }
}

/// Translated text for one word
pub type TranslationOutcome = Outcome<String>;

/// Generated image URL for one item
pub type ImageOutcome = Outcome<String>;

/// Stage at which an item failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Duplicate,
    Translate,
    Image,
    Persist,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureStage::Duplicate => "duplicate",
            FailureStage::Translate => "translate",
            FailureStage::Image => "image",
            FailureStage::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// One recorded failure. `item_key` is the word (add pipeline) or the card
/// id (backfill).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub item_key: String,
    pub stage: FailureStage,
    pub reason: String,
}

impl Failure {
    pub fn new(item_key: impl Into<String>, stage: FailureStage, reason: impl Into<String>) -> Self {
        Self {
            item_key: item_key.into(),
            stage,
            reason: reason.into(),
        }
    }
}
