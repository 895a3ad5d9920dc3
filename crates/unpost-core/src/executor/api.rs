use super::{ActionExecutor, ActionOutcome, ActionReport, Classification, ExecutorError};
use crate::error::UnpostError;
use crate::types::CandidateItem;
use crate::usage::UsageTracker;
use async_trait::async_trait;
use std::sync::Arc;
use x_client::{XClient, XError};

/// One authenticated, metered REST call per item.
pub struct ApiExecutor {
    client: Arc<XClient>,
    user_id: String,
    tracker: Arc<UsageTracker>,
}

impl ApiExecutor {
    pub fn new(client: Arc<XClient>, user_id: impl Into<String>, tracker: Arc<UsageTracker>) -> Self {
        Self {
            client,
            user_id: user_id.into(),
            tracker,
        }
    }

    fn spend(&self, label: &str) -> Result<(), ExecutorError> {
        self.tracker.consume(1, label).map_err(|e| match e {
            UnpostError::Quota(q) => ExecutorError::Quota(q),
            other => ExecutorError::Unexpected(other.to_string()),
        })
    }
}

#[async_trait]
impl ActionExecutor for ApiExecutor {
    async fn act(&mut self, item: &CandidateItem) -> Result<ActionReport, ExecutorError> {
        let outcome = match self.classify(item) {
            Classification::Original => {
                self.spend("delete")?;
                match self.client.delete_post(&item.id).await {
                    Ok(true) => ActionOutcome::Deleted,
                    Ok(false) => ActionOutcome::Failed {
                        reason: "delete not confirmed".into(),
                    },
                    Err(e) => outcome_for_error(e),
                }
            }
            Classification::RetractionOfRepost {
                target_id: Some(target),
            } => {
                self.spend("undo_repost")?;
                match self.client.undo_repost(&self.user_id, &target).await {
                    Ok(true) => ActionOutcome::Unreposted,
                    Ok(false) => ActionOutcome::Failed {
                        reason: "repost still present".into(),
                    },
                    Err(e) => outcome_for_error(e),
                }
            }
            Classification::RetractionOfRepost { target_id: None } => ActionOutcome::Failed {
                reason: "repost target unknown".into(),
            },
        };
        tracing::debug!(item_id = %item.id, ?outcome, "API action finished");
        Ok(outcome.into())
    }
}

fn outcome_for_error(err: XError) -> ActionOutcome {
    match err {
        XError::NotFound => ActionOutcome::AlreadyGone,
        XError::RateLimited { reset_at } => ActionOutcome::RateLimited {
            detail: format!("reset at {reset_at:?}"),
        },
        other => ActionOutcome::Failed {
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::{UsageLimits, Window};
    use tempfile::TempDir;

    fn tracker(dir: &TempDir, daily: Option<u64>) -> Arc<UsageTracker> {
        Arc::new(
            UsageTracker::open(
                dir.path().join("usage.json"),
                UsageLimits {
                    daily,
                    monthly: None,
                },
            )
            .unwrap(),
        )
    }

    fn executor(server: &mockito::Server, tracker: Arc<UsageTracker>) -> ApiExecutor {
        let client = Arc::new(XClient::new(&server.url(), "tok").unwrap());
        ApiExecutor::new(client, "42", tracker)
    }

    #[tokio::test]
    async fn original_is_deleted_and_metered() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/2/tweets/1")
            .with_status(200)
            .with_body(r#"{"data":{"deleted":true}}"#)
            .create_async()
            .await;
        let dir = TempDir::new().unwrap();
        let t = tracker(&dir, None);
        let mut ex = executor(&server, t.clone());

        let report = ex.act(&CandidateItem::original("1")).await.unwrap();
        assert_eq!(report.outcome, ActionOutcome::Deleted);
        assert_eq!(t.snapshot().count(Window::Daily), 1);
    }

    #[tokio::test]
    async fn repost_is_undone_against_target() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("DELETE", "/2/users/42/retweets/9")
            .with_status(200)
            .with_body(r#"{"data":{"retweeted":false}}"#)
            .create_async()
            .await;
        let dir = TempDir::new().unwrap();
        let mut ex = executor(&server, tracker(&dir, None));

        let report = ex.act(&CandidateItem::repost("2", "9")).await.unwrap();
        m.assert_async().await;
        assert_eq!(report.outcome, ActionOutcome::Unreposted);
    }

    #[tokio::test]
    async fn polarity_mismatch_is_a_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/2/users/42/retweets/9")
            .with_status(200)
            .with_body(r#"{"data":{"retweeted":true}}"#)
            .create_async()
            .await;
        server
            .mock("DELETE", "/2/tweets/1")
            .with_status(200)
            .with_body(r#"{"data":{"deleted":false}}"#)
            .create_async()
            .await;
        let dir = TempDir::new().unwrap();
        let mut ex = executor(&server, tracker(&dir, None));

        assert!(matches!(
            ex.act(&CandidateItem::repost("2", "9")).await.unwrap().outcome,
            ActionOutcome::Failed { .. }
        ));
        assert!(matches!(
            ex.act(&CandidateItem::original("1")).await.unwrap().outcome,
            ActionOutcome::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn not_found_is_already_gone_and_429_is_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/2/tweets/gone")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("DELETE", "/2/tweets/slow")
            .with_status(429)
            .create_async()
            .await;
        let dir = TempDir::new().unwrap();
        let mut ex = executor(&server, tracker(&dir, None));

        assert_eq!(
            ex.act(&CandidateItem::original("gone")).await.unwrap().outcome,
            ActionOutcome::AlreadyGone
        );
        assert!(matches!(
            ex.act(&CandidateItem::original("slow")).await.unwrap().outcome,
            ActionOutcome::RateLimited { .. }
        ));
    }

    #[tokio::test]
    async fn quota_refusal_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("DELETE", "/2/tweets/1")
            .with_status(200)
            .with_body(r#"{"data":{"deleted":true}}"#)
            .expect(0)
            .create_async()
            .await;
        let dir = TempDir::new().unwrap();
        let mut ex = executor(&server, tracker(&dir, Some(0)));

        let err = ex.act(&CandidateItem::original("1")).await.unwrap_err();
        assert!(matches!(err, ExecutorError::Quota(_)));
        m.assert_async().await;
    }
}
