use serde::{Deserialize, Serialize};

/// Generic `{ "data": ... }` envelope used by every v2 endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// A post returned by the user timeline endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "referenced_tweets")]
    pub referenced: Vec<ReferencedPost>,
}

impl Post {
    /// Id of the post this one re-shares, if it is a repost.
    pub fn repost_of(&self) -> Option<&str> {
        self.referenced
            .iter()
            .find(|r| r.kind == ReferenceKind::Retweeted)
            .map(|r| r.id.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferencedPost {
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Retweeted,
    Quoted,
    RepliedTo,
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TimelineResponse {
    #[serde(default)]
    pub data: Vec<Post>,
    #[serde(default)]
    pub meta: TimelineMeta,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TimelineMeta {
    #[serde(default)]
    pub next_token: Option<String>,
}

/// One page of a user's timeline.
#[derive(Debug, Clone, Default)]
pub struct TimelinePage {
    pub posts: Vec<Post>,
    /// `None` when this is the last page.
    pub next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteResult {
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepostResult {
    pub retweeted: bool,
}
