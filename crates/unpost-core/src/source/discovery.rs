//! Incremental discovery over a scrolling timeline.
//!
//! The page only ever shows a window of entries, so a batch is built by
//! sampling the visible set, keeping entries not seen before, and scrolling
//! between samples. Sampling stops at `min_batch` new items, after
//! `stagnation_limit` consecutive samples with nothing new, or after
//! `max_samples` samples, whichever comes first.
//!
//! Entries with no stable identity are de-duplicated by element handle and
//! never count as progress. A batch that found no new stably identified
//! entry is flagged exhausted.

use super::{Batch, ContentSource, SourceError};
use crate::types::CandidateItem;
use crate::ui::{EntrySnapshot, Pacer, Page, PageError};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryOptions {
    #[serde(default = "default_min_batch")]
    pub min_batch: usize,
    #[serde(default = "default_stagnation_limit")]
    pub stagnation_limit: u32,
    #[serde(default = "default_max_samples")]
    pub max_samples: u32,
}

fn default_min_batch() -> usize {
    20
}

fn default_stagnation_limit() -> u32 {
    3
}

fn default_max_samples() -> u32 {
    30
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            min_batch: default_min_batch(),
            stagnation_limit: default_stagnation_limit(),
            max_samples: default_max_samples(),
        }
    }
}

// ---------------------------------------------------------------------------
// Identity keys
// ---------------------------------------------------------------------------

static STATUS_RE: OnceLock<Regex> = OnceLock::new();

fn status_re() -> &'static Regex {
    STATUS_RE.get_or_init(|| Regex::new(r"/status(?:es)?/(\d+)").unwrap())
}

/// Numeric post id embedded in a permalink, if any.
pub fn status_id(permalink: &str) -> Option<String> {
    status_re()
        .captures(permalink)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Stable key for an entry: permalink id, else a digest of its text, else a
/// random key (such entries cannot be de-duplicated across samples).
pub fn identity_key(entry: &EntrySnapshot) -> String {
    if let Some(id) = entry.permalink.as_deref().and_then(status_id) {
        return id;
    }
    if let Some(text) = entry.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let digest = Sha256::digest(text.as_bytes());
        let mut key = String::from("content:");
        for byte in &digest[..12] {
            let _ = write!(key, "{byte:02x}");
        }
        return key;
    }
    format!("{ANON_PREFIX}{}", Uuid::new_v4())
}

const ANON_PREFIX: &str = "anon:";

/// False for the random keys given to entries with no permalink or text.
pub fn is_stable_key(key: &str) -> bool {
    !key.starts_with(ANON_PREFIX)
}

// ---------------------------------------------------------------------------
// DiscoverySource
// ---------------------------------------------------------------------------

pub struct DiscoverySource {
    page: Arc<dyn Page>,
    options: DiscoveryOptions,
    pacer: Pacer,
    /// Stable identity keys, plus `handle:` keys for unidentifiable entries.
    seen: HashSet<String>,
}

impl DiscoverySource {
    pub fn new(page: Arc<dyn Page>, options: DiscoveryOptions, pacer: Pacer) -> Self {
        Self {
            page,
            options,
            pacer,
            seen: HashSet::new(),
        }
    }

    pub fn seen(&self) -> usize {
        self.seen.len()
    }
}

#[async_trait]
impl ContentSource for DiscoverySource {
    async fn next_batch(&mut self) -> Result<Batch, SourceError> {
        let mut items = Vec::new();
        let mut stable_total = 0usize;
        let mut stagnant = 0u32;

        for sample in 0..self.options.max_samples {
            let entries = self.page.entries().await.map_err(source_error)?;
            let mut fresh = 0usize;
            for entry in entries {
                let key = identity_key(&entry);
                let stable = is_stable_key(&key);
                let seen_key = if stable {
                    key.clone()
                } else {
                    format!("handle:{}", entry.handle.0)
                };
                if !self.seen.insert(seen_key) {
                    continue;
                }
                if stable {
                    fresh += 1;
                }
                items.push(CandidateItem {
                    id: key,
                    references: Vec::new(),
                    marked_repost: entry.reposted,
                    handle: Some(entry.handle),
                });
            }
            stable_total += fresh;
            tracing::debug!(sample, fresh, collected = items.len(), "Timeline sampled");

            if items.len() >= self.options.min_batch {
                break;
            }
            if fresh == 0 {
                stagnant += 1;
                if stagnant >= self.options.stagnation_limit {
                    tracing::debug!(stagnant, "Discovery stagnated");
                    break;
                }
            } else {
                stagnant = 0;
            }

            if sample + 1 < self.options.max_samples {
                self.page.reveal_more().await.map_err(source_error)?;
                self.pacer.pause().await;
            }
        }

        Ok(Batch {
            exhausted: stable_total == 0,
            items,
        })
    }
}

fn source_error(err: PageError) -> SourceError {
    SourceError::Unavailable(err.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
