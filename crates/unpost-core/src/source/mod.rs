//! Content sources: where candidate items come from.
//!
//! Both strategies satisfy [`ContentSource`]; the orchestrator never knows
//! which one it is driving.

pub mod discovery;
pub mod paginated;

use crate::types::CandidateItem;
use async_trait::async_trait;
use thiserror::Error;

pub use discovery::{DiscoveryOptions, DiscoverySource};
pub use paginated::PaginatedSource;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub items: Vec<CandidateItem>,
    /// The source has nothing beyond this batch.
    pub exhausted: bool,
}

#[derive(Debug, Error)]
pub enum SourceError {
    /// Rate limited, quota spent or transport failure. Never corrupts state;
    /// the run stops and can be resumed.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// No more content. Terminal.
    #[error("source exhausted")]
    Exhausted,

    #[error("unexpected source error: {0}")]
    Unexpected(String),
}

#[async_trait]
pub trait ContentSource: Send {
    async fn next_batch(&mut self) -> Result<Batch, SourceError>;

    /// Resume token for the batch after the most recent one, if the source
    /// is cursor-based.
    fn cursor(&self) -> Option<&str> {
        None
    }
}
