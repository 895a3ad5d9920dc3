use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Backend / RunMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Metered REST API.
    #[default]
    Api,
    /// Simulated interaction with the web timeline.
    Ui,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Api => f.write_str("api"),
            Backend::Ui => f.write_str("ui"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Discover and classify only. No side effects, no persisted state.
    Dry,
    /// Perform retractions.
    Auto,
}

impl RunMode {
    pub fn is_dry(self) -> bool {
        matches!(self, RunMode::Dry)
    }
}

// ---------------------------------------------------------------------------
// CandidateItem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Repost,
    Quote,
    Reply,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub relation: Relation,
    pub target_id: String,
}

/// Opaque handle to the on-page element an item was discovered in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub String);

/// One timeline entry as discovered in the current cycle. Only `id` is ever
/// persisted, and only after the item is settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub id: String,
    pub references: Vec<Reference>,
    /// Set by sources that can see an item is a repost without knowing the
    /// target id.
    pub marked_repost: bool,
    pub handle: Option<ElementHandle>,
}

impl CandidateItem {
    pub fn original(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            references: Vec::new(),
            marked_repost: false,
            handle: None,
        }
    }

    pub fn repost(id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            references: vec![Reference {
                relation: Relation::Repost,
                target_id: target_id.into(),
            }],
            marked_repost: false,
            handle: None,
        }
    }

    pub fn repost_target(&self) -> Option<&str> {
        self.references
            .iter()
            .find(|r| r.relation == Relation::Repost)
            .map(|r| r.target_id.as_str())
    }
}

impl From<&x_client::Post> for CandidateItem {
    fn from(post: &x_client::Post) -> Self {
        let references = post
            .referenced
            .iter()
            .map(|r| Reference {
                relation: match r.kind {
                    x_client::ReferenceKind::Retweeted => Relation::Repost,
                    x_client::ReferenceKind::Quoted => Relation::Quote,
                    x_client::ReferenceKind::RepliedTo => Relation::Reply,
                    x_client::ReferenceKind::Other => Relation::Other,
                },
                target_id: r.id.clone(),
            })
            .collect();
        Self {
            id: post.id.clone(),
            references,
            marked_repost: false,
            handle: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_with_retweet_reference_maps_to_repost() {
        let post: x_client::Post = serde_json::from_str(
            r#"{"id":"2","referenced_tweets":[{"type":"replied_to","id":"1"},{"type":"retweeted","id":"9"}]}"#,
        )
        .unwrap();
        let item = CandidateItem::from(&post);
        assert_eq!(item.id, "2");
        assert_eq!(item.repost_target(), Some("9"));
    }

    #[test]
    fn reply_is_not_a_repost() {
        let post: x_client::Post =
            serde_json::from_str(r#"{"id":"3","referenced_tweets":[{"type":"replied_to","id":"1"}]}"#)
                .unwrap();
        assert_eq!(CandidateItem::from(&post).repost_target(), None);
    }
}
