//! Crawl passes over the remote API
//!
//! Three passes, each a loop over independent units of work:
//! - Posts: walk every configured listing and cache each post by id
//! - Comments: fetch comment trees for cached posts that have none stored
//! - Update: re-fetch every cached post by id to refresh its counters
//!
//! Failures are isolated to their unit (one listing, one post, one id
//! batch); the pass logs them and carries on with the rest.

mod comments;
mod planner;

pub use comments::{fetch_comment_tree, fetch_comments, CommentsSummary, FetchedTree};
pub use planner::{fetch_posts, update_posts, PostsSummary, SeenIndex, UpdateSummary};

use crate::reddit::ApiError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// A single listing failed to fetch; the posts pass continues without it
#[derive(Debug, Error)]
#[error("Listing fetch failed for {listing}: {source}")]
pub struct ListingFetchFailed {
    /// Identifier of the listing that failed
    pub listing: String,
    #[source]
    pub source: ApiError,
}

/// Cooperative stop signal, checked between units of work
///
/// Setting the flag never interrupts an in-flight fetch; the current unit
/// finishes (or fails) normally and nothing new starts after it.
#[derive(Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Arms the flag on Ctrl-C.
    pub fn arm_ctrl_c(&self) {
        let flag = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, stopping after the current unit of work");
                flag.set();
            }
        });
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::model::{CommentRecord, PostRecord};
    use crate::reddit::{ApiError, ApiResult, Expansion, ListingSpec, RedditApi};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted stand-in for the remote API
    ///
    /// Responses are queued per listing, per (post, expansion) pair, and
    /// per by-id lookup; each call consumes one queued response and an
    /// unscripted call panics so tests catch unexpected traffic.
    pub(crate) struct ScriptedApi {
        listings: Mutex<HashMap<String, Vec<ApiResult<Vec<PostRecord>>>>>,
        comments: Mutex<HashMap<(String, Expansion), Vec<ApiResult<Vec<CommentRecord>>>>>,
        lookups: Mutex<Vec<ApiResult<Vec<PostRecord>>>>,
        pub(crate) comment_calls: Mutex<Vec<(String, Expansion)>>,
        pub(crate) lookup_calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedApi {
        pub(crate) fn new() -> Self {
            Self {
                listings: Mutex::new(HashMap::new()),
                comments: Mutex::new(HashMap::new()),
                lookups: Mutex::new(Vec::new()),
                comment_calls: Mutex::new(Vec::new()),
                lookup_calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn script_listing(
            &self,
            listing: &ListingSpec,
            result: ApiResult<Vec<PostRecord>>,
        ) {
            self.listings
                .lock()
                .unwrap()
                .entry(listing.to_string())
                .or_default()
                .push(result);
        }

        pub(crate) fn script_comments(
            &self,
            post_id: &str,
            expansion: Expansion,
            result: ApiResult<Vec<CommentRecord>>,
        ) {
            self.comments
                .lock()
                .unwrap()
                .entry((post_id.to_string(), expansion))
                .or_default()
                .push(result);
        }

        pub(crate) fn script_lookup(&self, result: ApiResult<Vec<PostRecord>>) {
            self.lookups.lock().unwrap().push(result);
        }

        /// A representative non-overflow remote failure
        pub(crate) fn unavailable() -> ApiError {
            ApiError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                url: "scripted".to_string(),
            }
        }
    }

    #[async_trait]
    impl RedditApi for ScriptedApi {
        async fn listing_posts(
            &self,
            _subreddit: &str,
            listing: &ListingSpec,
        ) -> ApiResult<Vec<PostRecord>> {
            let key = listing.to_string();
            let mut listings = self.listings.lock().unwrap();
            match listings.get_mut(&key) {
                Some(queue) if !queue.is_empty() => queue.remove(0),
                _ => panic!("no scripted response for listing {key}"),
            }
        }

        async fn post_comments(
            &self,
            _subreddit: &str,
            post_id: &str,
            expansion: Expansion,
        ) -> ApiResult<Vec<CommentRecord>> {
            self.comment_calls
                .lock()
                .unwrap()
                .push((post_id.to_string(), expansion));

            let key = (post_id.to_string(), expansion);
            let mut comments = self.comments.lock().unwrap();
            match comments.get_mut(&key) {
                Some(queue) if !queue.is_empty() => queue.remove(0),
                _ => panic!("no scripted response for post {} ({:?})", key.0, key.1),
            }
        }

        async fn posts_by_id(&self, ids: &[String]) -> ApiResult<Vec<PostRecord>> {
            self.lookup_calls.lock().unwrap().push(ids.to_vec());

            let mut lookups = self.lookups.lock().unwrap();
            if lookups.is_empty() {
                panic!("no scripted response for posts_by_id");
            }
            lookups.remove(0)
        }
    }

    pub(crate) fn test_post(id: &str, score: i64) -> PostRecord {
        PostRecord {
            id: id.to_string(),
            author: "alice".to_string(),
            title: format!("post {id}"),
            selftext: String::new(),
            url: format!("https://example.com/{id}"),
            permalink: format!("/r/test/comments/{id}/"),
            created: 1_615_819_072,
            edited: None,
            num_comments: 1,
            score,
        }
    }

    pub(crate) fn test_comment(id: &str, post_id: &str) -> CommentRecord {
        CommentRecord {
            id: id.to_string(),
            post_id: post_id.to_string(),
            author: "bob".to_string(),
            body: "a comment".to_string(),
            created: 1_615_819_100,
            edited: None,
            score: 1,
            permalink: format!("/r/test/comments/{post_id}/_/{id}/"),
        }
    }
}
