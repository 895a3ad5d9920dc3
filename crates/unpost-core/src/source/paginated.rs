use super::{Batch, ContentSource, SourceError};
use crate::error::UnpostError;
use crate::types::CandidateItem;
use crate::usage::UsageTracker;
use async_trait::async_trait;
use std::sync::Arc;
use x_client::{XClient, XError};

/// Cursor-paged timeline over the metered REST API. One fetch per batch,
/// each fetch metered when a tracker is attached.
pub struct PaginatedSource {
    client: Arc<XClient>,
    user_id: String,
    page_size: u32,
    tracker: Option<Arc<UsageTracker>>,
    cursor: Option<String>,
    exhausted: bool,
}

impl PaginatedSource {
    pub fn new(
        client: Arc<XClient>,
        user_id: impl Into<String>,
        page_size: u32,
        tracker: Option<Arc<UsageTracker>>,
        start_cursor: Option<String>,
    ) -> Self {
        Self {
            client,
            user_id: user_id.into(),
            page_size,
            tracker,
            cursor: start_cursor,
            exhausted: false,
        }
    }
}

#[async_trait]
impl ContentSource for PaginatedSource {
    async fn next_batch(&mut self) -> Result<Batch, SourceError> {
        if self.exhausted {
            return Err(SourceError::Exhausted);
        }

        if let Some(tracker) = &self.tracker {
            tracker.consume(1, "timeline_page").map_err(|e| match e {
                UnpostError::Quota(q) => SourceError::Unavailable(q.to_string()),
                other => SourceError::Unexpected(other.to_string()),
            })?;
        }

        let page = self
            .client
            .user_posts(&self.user_id, self.cursor.as_deref(), self.page_size)
            .await
            .map_err(source_error)?;

        let items: Vec<CandidateItem> = page.posts.iter().map(CandidateItem::from).collect();
        self.exhausted = page.next_token.is_none();
        self.cursor = page.next_token;
        tracing::info!(
            count = items.len(),
            next_cursor = ?self.cursor,
            "Fetched timeline page"
        );

        Ok(Batch {
            items,
            exhausted: self.exhausted,
        })
    }

    fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }
}

fn source_error(err: XError) -> SourceError {
    match err {
        XError::RateLimited { reset_at } => {
            SourceError::Unavailable(format!("rate limited (reset at {reset_at:?})"))
        }
        XError::Network(msg) => SourceError::Unavailable(msg),
        XError::Api { status, message } if status >= 500 => {
            SourceError::Unavailable(format!("status {status}: {message}"))
        }
        other => SourceError::Unexpected(other.to_string()),
    }
}
