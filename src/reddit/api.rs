//! Remote API capability
//!
//! The crawl passes depend on this trait rather than on a concrete HTTP
//! client, so components receive the client they should use instead of
//! reaching for a shared one, and tests can substitute a scripted double.

use crate::model::{CommentRecord, PostRecord};
use crate::reddit::{ApiResult, ListingSpec};
use async_trait::async_trait;

/// Most ids a single by-id lookup request will carry.
pub const MAX_IDS_PER_LOOKUP: usize = 100;

/// How far to resolve "load more comments" continuations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expansion {
    /// Resolve every continuation, however many extra requests that takes
    All,
    /// Keep only the comments the first response carries
    None,
}

/// Read access to the remote content API
#[async_trait]
pub trait RedditApi: Send + Sync {
    /// Fetches every page of one listing for the subreddit.
    async fn listing_posts(
        &self,
        subreddit: &str,
        listing: &ListingSpec,
    ) -> ApiResult<Vec<PostRecord>>;

    /// Fetches one post's comment tree, flattened depth-first.
    ///
    /// Under `Expansion::All` the tree is complete, and the call fails
    /// with `ApiError::ResultSetTooLarge` when the remote refuses to
    /// expand it in full. Under `Expansion::None` continuations are
    /// dropped and the result may be truncated.
    async fn post_comments(
        &self,
        subreddit: &str,
        post_id: &str,
        expansion: Expansion,
    ) -> ApiResult<Vec<CommentRecord>>;

    /// Re-fetches posts by id, at most `MAX_IDS_PER_LOOKUP` per call.
    ///
    /// Ids the remote no longer recognizes are simply missing from the
    /// result; the call does not fail on their account.
    async fn posts_by_id(&self, ids: &[String]) -> ApiResult<Vec<PostRecord>>;
}
