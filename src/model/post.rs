use serde::{Deserialize, Serialize};

/// A top-level submission in the crawled subreddit.
///
/// The `id` is the remote system's base-36 identifier and never changes; a
/// post may be re-fetched and its document overwritten (for instance to
/// refresh `score` and `num_comments`), but the key stays stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Base-36 post id, unique per subreddit era
    pub id: String,

    /// Author name, `"[deleted]"` when the account is gone
    pub author: String,

    /// Post title
    pub title: String,

    /// Body text for self posts, empty for link posts
    pub selftext: String,

    /// Target URL of the submission
    pub url: String,

    /// Site-relative permalink to the post
    pub permalink: String,

    /// Creation time, epoch seconds UTC
    pub created: i64,

    /// Last edit time, epoch seconds UTC; `None` when never edited
    #[serde(default)]
    pub edited: Option<i64>,

    /// Comment count reported by the remote system
    pub num_comments: u32,

    /// Net score, may be negative
    pub score: i64,
}
