//! Comment tree fetching with bounded concurrency

use crate::cache::{CacheResult, ContentCache};
use crate::model::CommentRecord;
use crate::reddit::{ApiError, ApiResult, Expansion, RedditApi};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::{SeenIndex, ShutdownFlag};

/// A post's comment tree as fetched, flattened to records
#[derive(Debug)]
pub struct FetchedTree {
    pub comments: Vec<CommentRecord>,
    /// True when the tree was too large to expand and stub branches
    /// were left unexpanded
    pub truncated: bool,
}

/// Fetches one post's comment tree, preferring full expansion.
///
/// When the remote refuses the expanded form because the result set is
/// too large, the fetch retries exactly once without expansion and marks
/// the tree truncated. Any other failure is returned to the caller.
pub async fn fetch_comment_tree(
    api: &dyn RedditApi,
    subreddit: &str,
    post_id: &str,
) -> ApiResult<FetchedTree> {
    match api.post_comments(subreddit, post_id, Expansion::All).await {
        Ok(comments) => Ok(FetchedTree {
            comments,
            truncated: false,
        }),
        Err(ApiError::ResultSetTooLarge) => {
            tracing::warn!(
                "Comment tree for post {} is too large to expand; taking the truncated tree",
                post_id
            );
            let comments = api
                .post_comments(subreddit, post_id, Expansion::None)
                .await?;
            Ok(FetchedTree {
                comments,
                truncated: true,
            })
        }
        Err(err) => Err(err),
    }
}

/// Outcome of one comments pass
#[derive(Debug)]
pub struct CommentsSummary {
    /// Posts that already had stored comments
    pub posts_skipped: u64,
    /// Posts whose trees were fetched and written
    pub posts_fetched: u64,
    /// Posts whose trees could not be fetched
    pub posts_failed: u64,
    /// Fetched posts that took the truncated tree
    pub posts_truncated: u64,
    /// Posts not attempted because of a stop request
    pub posts_cancelled: u64,
    /// Comment documents written
    pub comments_saved: u64,
    /// Comments that could not be written to the cache
    pub comments_failed: u64,
    /// Cached post documents skipped because they could not be read
    pub documents_skipped: u64,
}

enum PostOutcome {
    Fetched {
        saved: u64,
        failed: u64,
        truncated: bool,
    },
    Failed,
    Cancelled,
}

/// Fetches comment trees for every cached post with no stored comments.
///
/// At most `max_concurrent` fetches run at once; all of them share the
/// client's request pacing. A post with an empty tree stores nothing and
/// stays eligible on the next run. A failed post is logged and skipped
/// without aborting the rest of the pass.
pub async fn fetch_comments(
    api: Arc<dyn RedditApi>,
    cache: Arc<ContentCache>,
    subreddit: &str,
    max_concurrent: usize,
    shutdown: &ShutdownFlag,
) -> CacheResult<CommentsSummary> {
    let mut summary = CommentsSummary {
        posts_skipped: 0,
        posts_fetched: 0,
        posts_failed: 0,
        posts_truncated: 0,
        posts_cancelled: 0,
        comments_saved: 0,
        comments_failed: 0,
        documents_skipped: 0,
    };

    let index = SeenIndex::build(&cache)?;
    tracing::info!("{} posts already have stored comments", index.seen_posts());

    let mut candidates = Vec::new();
    for document in cache.posts()? {
        match document {
            Ok(post) => {
                if index.is_seen(&post.id) {
                    tracing::debug!("Post {} already has stored comments", post.id);
                    summary.posts_skipped += 1;
                } else {
                    candidates.push(post.id);
                }
            }
            Err(err) => {
                tracing::warn!("Skipping unreadable post document: {}", err);
                summary.documents_skipped += 1;
            }
        }
    }

    // Directory scan order is unspecified; sort so runs are comparable.
    candidates.sort_unstable();
    tracing::info!("Fetching comment trees for {} posts", candidates.len());

    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut tasks: JoinSet<PostOutcome> = JoinSet::new();
    let total = candidates.len();

    for (started, post_id) in candidates.into_iter().enumerate() {
        if shutdown.is_set() {
            summary.posts_cancelled += (total - started) as u64;
            tracing::info!("Stopping comments pass with {} posts unfetched", total - started);
            break;
        }

        let api = Arc::clone(&api);
        let cache = Arc::clone(&cache);
        let semaphore = Arc::clone(&semaphore);
        let shutdown = shutdown.clone();
        let subreddit = subreddit.to_string();

        tasks.spawn(async move {
            // The semaphore is never closed while tasks hold it.
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return PostOutcome::Failed,
            };

            if shutdown.is_set() {
                return PostOutcome::Cancelled;
            }

            let tree = match fetch_comment_tree(api.as_ref(), &subreddit, &post_id).await {
                Ok(tree) => tree,
                Err(err) => {
                    tracing::warn!("Failed to fetch comments for post {}: {}", post_id, err);
                    return PostOutcome::Failed;
                }
            };

            let mut saved = 0u64;
            let mut failed = 0u64;
            for comment in &tree.comments {
                match cache.put_comment(comment) {
                    Ok(()) => saved += 1,
                    Err(err) => {
                        tracing::warn!("Failed to cache comment {}: {}", comment.id, err);
                        failed += 1;
                    }
                }
            }
            tracing::info!("Cached {} comments for post {}", saved, post_id);

            PostOutcome::Fetched {
                saved,
                failed,
                truncated: tree.truncated,
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(PostOutcome::Fetched {
                saved,
                failed,
                truncated,
            }) => {
                summary.posts_fetched += 1;
                summary.comments_saved += saved;
                summary.comments_failed += failed;
                if truncated {
                    summary.posts_truncated += 1;
                }
            }
            Ok(PostOutcome::Failed) => summary.posts_failed += 1,
            Ok(PostOutcome::Cancelled) => summary.posts_cancelled += 1,
            Err(err) => {
                tracing::warn!("Comment fetch task aborted: {}", err);
                summary.posts_failed += 1;
            }
        }
    }

    Ok(summary)
}
