//! `x-client`: the handful of X REST API v2 endpoints needed to retract a
//! user's own timeline: page through it, delete an original post, undo a
//! repost.
//!
//! Every call is a single authenticated request. Status codes that callers
//! make decisions on are surfaced as distinct variants: `404` becomes
//! [`XError::NotFound`] and `429` becomes [`XError::RateLimited`].

pub mod error;
pub mod types;

pub use error::{Result, XError};
pub use types::{Post, ReferenceKind, ReferencedPost, TimelinePage, User};

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use types::{ApiResponse, DeleteResult, RepostResult, TimelineResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.x.com";

/// Largest page size the timeline endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

pub struct XClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl XClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Resolve the authenticated user.
    pub async fn me(&self) -> Result<User> {
        let url = format!("{}/2/users/me", self.base_url);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let api_resp: ApiResponse<User> = decode(resp).await?;
        Ok(api_resp.data)
    }

    /// Fetch one page of `user_id`'s timeline, newest first.
    pub async fn user_posts(
        &self,
        user_id: &str,
        pagination_token: Option<&str>,
        max_results: u32,
    ) -> Result<TimelinePage> {
        let url = format!("{}/2/users/{}/tweets", self.base_url, user_id);
        let mut query: Vec<(&str, String)> = vec![
            ("max_results", max_results.to_string()),
            ("tweet.fields", "referenced_tweets".to_string()),
        ];
        if let Some(token) = pagination_token {
            query.push(("pagination_token", token.to_string()));
        }

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await?;
        let timeline: TimelineResponse = decode(resp).await?;
        tracing::debug!(
            user_id,
            count = timeline.data.len(),
            has_next = timeline.meta.next_token.is_some(),
            "Fetched timeline page"
        );

        Ok(TimelinePage {
            posts: timeline.data,
            next_token: timeline.meta.next_token,
        })
    }

    /// Delete an original post. Returns `true` only when the API reports
    /// `deleted: true`.
    pub async fn delete_post(&self, post_id: &str) -> Result<bool> {
        let url = format!("{}/2/tweets/{}", self.base_url, post_id);
        let resp = self
            .client
            .delete(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let api_resp: ApiResponse<DeleteResult> = decode(resp).await?;
        Ok(api_resp.data.deleted)
    }

    /// Undo a repost of `source_id`. Returns `true` only when the API reports
    /// `retweeted: false`.
    pub async fn undo_repost(&self, user_id: &str, source_id: &str) -> Result<bool> {
        let url = format!(
            "{}/2/users/{}/retweets/{}",
            self.base_url, user_id, source_id
        );
        let resp = self
            .client
            .delete(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let api_resp: ApiResponse<RepostResult> = decode(resp).await?;
        Ok(!api_resp.data.retweeted)
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Err(XError::NotFound);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        let reset_at = resp
            .headers()
            .get("x-rate-limit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok());
        return Err(XError::RateLimited { reset_at });
    }
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(XError::Api {
            status: status.as_u16(),
            message,
        });
    }
    let body = resp.text().await?;
    Ok(serde_json::from_str(&body)?)
}
