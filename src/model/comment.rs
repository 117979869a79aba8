use serde::{Deserialize, Serialize};

/// A single comment from a post's flattened comment tree.
///
/// `post_id` references a [`PostRecord`](crate::model::PostRecord) that is
/// expected to exist in the cache; referential integrity is a caller
/// responsibility (posts are fetched before their comments). Comments are
/// written once and never refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    /// Base-36 comment id, unique within the subreddit's comment namespace
    pub id: String,

    /// Id of the post this comment belongs to
    pub post_id: String,

    /// Author name, `"[deleted]"` when the account is gone
    pub author: String,

    /// Comment body text
    pub body: String,

    /// Creation time, epoch seconds UTC
    pub created: i64,

    /// Last edit time, epoch seconds UTC; `None` when never edited
    #[serde(default)]
    pub edited: Option<i64>,

    /// Net score, may be negative
    pub score: i64,

    /// Site-relative permalink to the comment
    pub permalink: String,
}
