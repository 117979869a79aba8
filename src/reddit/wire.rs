//! Wire format of the content API
//!
//! Every object the API returns arrives in a kind/data envelope; listings
//! nest further envelopes, and comment replies nest whole listings. These
//! types exist only long enough to be decoded and converted into cache
//! records.

use crate::model::{resolve_author, CommentRecord, PostRecord};
use serde::Deserialize;

/// Envelope around one listing response
#[derive(Debug, Deserialize)]
pub struct ListingEnvelope {
    pub data: ListingData,
}

/// One page of a listing: a cursor plus kind-tagged children
#[derive(Debug, Deserialize)]
pub struct ListingData {
    /// Cursor for the next page, absent or null on the last page
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ListingData {
    /// Pulls the post records out of one listing page.
    pub fn into_posts(self) -> Vec<PostRecord> {
        self.children
            .into_iter()
            .filter_map(|node| match node {
                Node::Post(post) => Some(post.into_record()),
                _ => None,
            })
            .collect()
    }
}

/// A kind-tagged object inside a listing or comment tree
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum Node {
    #[serde(rename = "t3")]
    Post(Box<PostData>),
    #[serde(rename = "t1")]
    Comment(Box<CommentData>),
    #[serde(rename = "more")]
    More(MoreData),
    /// Kinds this crawler has no use for (accounts, subreddits, awards)
    #[serde(other)]
    Other,
}

/// Post fields as the API sends them
#[derive(Debug, Deserialize)]
pub struct PostData {
    pub id: String,
    /// Absent or null when the posting account is gone
    #[serde(default)]
    pub author: Option<String>,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub permalink: String,
    pub created_utc: f64,
    #[serde(default)]
    pub edited: Edited,
    #[serde(default)]
    pub num_comments: u32,
    #[serde(default)]
    pub score: i64,
}

impl PostData {
    /// Converts wire data into the cached record shape.
    pub fn into_record(self) -> PostRecord {
        PostRecord {
            id: self.id,
            author: resolve_author(self.author),
            title: self.title,
            selftext: self.selftext,
            url: self.url,
            permalink: self.permalink,
            created: self.created_utc as i64,
            edited: self.edited.timestamp(),
            num_comments: self.num_comments,
            score: self.score,
        }
    }
}

/// Comment fields as the API sends them
#[derive(Debug, Deserialize)]
pub struct CommentData {
    pub id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
    pub created_utc: f64,
    #[serde(default)]
    pub edited: Edited,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub permalink: String,
    /// Nested replies; the API sends an empty string instead of a listing
    /// when there are none
    #[serde(default)]
    pub replies: Option<Replies>,
}

impl CommentData {
    /// Converts wire data into the cached record shape.
    ///
    /// The post id comes from the caller: comments are only ever fetched
    /// in the context of one known post.
    pub fn into_record(self, post_id: &str) -> CommentRecord {
        CommentRecord {
            id: self.id,
            post_id: post_id.to_string(),
            author: resolve_author(self.author),
            body: self.body,
            created: self.created_utc as i64,
            edited: self.edited.timestamp(),
            score: self.score,
            permalink: self.permalink,
        }
    }
}

/// Replies slot on a comment
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Replies {
    Forest(Box<ListingEnvelope>),
    Empty(String),
}

/// Edit marker: `false` when never edited, an epoch timestamp otherwise
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Edited {
    Flag(bool),
    Timestamp(f64),
}

impl Edited {
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            Edited::Flag(_) => None,
            Edited::Timestamp(secs) => Some(*secs as i64),
        }
    }
}

impl Default for Edited {
    fn default() -> Self {
        Edited::Flag(false)
    }
}

/// Continuation stub standing in for comments the response left out
#[derive(Debug, Deserialize)]
pub struct MoreData {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub children: Vec<String>,
}

/// Response envelope of the continuation-resolution endpoint
#[derive(Debug, Deserialize)]
pub struct MoreChildrenEnvelope {
    pub json: MoreChildrenBody,
}

#[derive(Debug, Deserialize)]
pub struct MoreChildrenBody {
    #[serde(default)]
    pub data: Option<MoreChildrenData>,
}

#[derive(Debug, Deserialize)]
pub struct MoreChildrenData {
    #[serde(default)]
    pub things: Vec<Node>,
}

/// Flattens a comment forest depth-first into records, collecting the ids
/// of any continuation stubs encountered along the way.
pub fn flatten_forest(
    nodes: Vec<Node>,
    post_id: &str,
    records: &mut Vec<CommentRecord>,
    more_ids: &mut Vec<String>,
) {
    for node in nodes {
        match node {
            Node::Comment(comment) => {
                let mut comment = *comment;
                let replies = comment.replies.take();
                records.push(comment.into_record(post_id));

                if let Some(Replies::Forest(envelope)) = replies {
                    flatten_forest(envelope.data.children, post_id, records, more_ids);
                }
            }
            Node::More(more) => more_ids.extend(more.children),
            Node::Post(_) | Node::Other => {}
        }
    }
}
