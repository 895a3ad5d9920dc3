//! Durable record of settled item ids plus the source resume cursor.

use crate::error::Result;
use crate::io::{atomic_write, read_optional};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// CheckpointState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointState {
    #[serde(default)]
    processed_ids: BTreeSet<String>,
    #[serde(default)]
    cursor: Option<String>,
}

impl CheckpointState {
    pub fn contains(&self, id: &str) -> bool {
        self.processed_ids.contains(id)
    }

    /// Returns `true` if the id was not already present.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.processed_ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.processed_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed_ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.processed_ids.iter().map(String::as_str)
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn set_cursor(&mut self, cursor: Option<String>) {
        self.cursor = cursor;
    }
}

// ---------------------------------------------------------------------------
// CheckpointStore
// ---------------------------------------------------------------------------

pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn at_root(root: &Path) -> Self {
        Self::new(paths::checkpoint_path(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted state. Without `resume`, or when nothing usable is
    /// on disk, the run starts from an empty state.
    pub fn load(&self, resume: bool) -> Result<CheckpointState> {
        if !resume {
            return Ok(CheckpointState::default());
        }
        let Some(data) = read_optional(&self.path)? else {
            tracing::info!(path = %self.path.display(), "No checkpoint found, starting fresh");
            return Ok(CheckpointState::default());
        };
        match serde_json::from_str::<CheckpointState>(&data) {
            Ok(state) => {
                tracing::info!(
                    processed = state.len(),
                    cursor = ?state.cursor,
                    "Resuming from checkpoint"
                );
                Ok(state)
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Checkpoint unreadable, starting fresh"
                );
                Ok(CheckpointState::default())
            }
        }
    }

    /// Replace the file with the full current state.
    pub fn save(&self, state: &CheckpointState) -> Result<()> {
        let data = serde_json::to_vec_pretty(state)?;
        atomic_write(&self.path, &data)?;
        tracing::debug!(processed = state.len(), cursor = ?state.cursor, "Checkpoint saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
