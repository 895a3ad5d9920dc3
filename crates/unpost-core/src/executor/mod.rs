//! Action executors: classify a candidate and retract it.
//!
//! [`ApiExecutor`] performs one metered REST call per item; [`UiExecutor`]
//! drives the page through a short click sequence with human-paced waits.

pub mod api;
pub mod ui;

use crate::types::CandidateItem;
use crate::usage::QuotaExceeded;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use api::ApiExecutor;
pub use ui::UiExecutor;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    Original,
    /// `target_id` is `None` when the source could only tell that the item
    /// is a repost.
    RetractionOfRepost { target_id: Option<String> },
}

/// An item referencing another item as a repost is a repost to undo;
/// everything else is an original to delete.
pub fn classify(item: &CandidateItem) -> Classification {
    if let Some(target) = item.repost_target() {
        return Classification::RetractionOfRepost {
            target_id: Some(target.to_string()),
        };
    }
    if item.marked_repost {
        return Classification::RetractionOfRepost { target_id: None };
    }
    Classification::Original
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    Deleted,
    Unreposted,
    /// Target no longer exists. Counts as settled.
    AlreadyGone,
    /// State is ambiguous (primary control absent). Counts as settled.
    Skipped { reason: String },
    /// Could not be confirmed. Left unsettled for a later resume.
    Failed { reason: String },
    /// The remote side asked us to back off. Ends the run.
    RateLimited { detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub outcome: ActionOutcome,
    pub retries: u32,
}

impl From<ActionOutcome> for ActionReport {
    fn from(outcome: ActionOutcome) -> Self {
        Self {
            outcome,
            retries: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Quota(#[from] QuotaExceeded),

    #[error("unexpected executor error: {0}")]
    Unexpected(String),
}

#[async_trait]
pub trait ActionExecutor: Send {
    fn classify(&self, item: &CandidateItem) -> Classification {
        classify(item)
    }

    async fn act(&mut self, item: &CandidateItem) -> Result<ActionReport, ExecutorError>;
}
