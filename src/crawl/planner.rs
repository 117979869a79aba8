//! Crawl planning: the seen-posts index and the posts/update passes

use crate::cache::{CacheResult, ContentCache, Partition};
use crate::crawl::{ListingFetchFailed, ShutdownFlag};
use crate::reddit::{ListingSpec, RedditApi, MAX_IDS_PER_LOOKUP};
use std::collections::HashMap;

/// Which posts already have comments stored, with per-post counts
///
/// Built once per crawl session by scanning the comments partition; the
/// partition is not expected to change underneath a single run. A post
/// with zero stored comments is indistinguishable from one never fetched,
/// so zero-comment posts are re-checked on every run. Re-fetching an
/// empty tree is a cheap no-op, so that stays acceptable.
pub struct SeenIndex {
    counts: HashMap<String, u64>,
}

impl SeenIndex {
    /// Builds the index by grouping cached comments by their post id.
    ///
    /// Unreadable documents are logged and skipped; one bad file must not
    /// block the whole crawl.
    pub fn build(cache: &ContentCache) -> CacheResult<Self> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        let mut skipped = 0u64;

        for document in cache.comments()? {
            match document {
                Ok(comment) => *counts.entry(comment.post_id).or_insert(0) += 1,
                Err(err) => {
                    tracing::warn!("Skipping unreadable comment document: {}", err);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            tracing::warn!("{} comment documents were unreadable during index build", skipped);
        }

        Ok(Self { counts })
    }

    /// True when at least one comment is stored for this post.
    pub fn is_seen(&self, post_id: &str) -> bool {
        self.counts.contains_key(post_id)
    }

    /// Number of stored comments for this post.
    pub fn comment_count(&self, post_id: &str) -> u64 {
        self.counts.get(post_id).copied().unwrap_or(0)
    }

    /// Number of distinct posts with stored comments.
    pub fn seen_posts(&self) -> usize {
        self.counts.len()
    }
}

/// Outcome of one posts pass
#[derive(Debug)]
pub struct PostsSummary {
    /// Listings fetched to completion
    pub listings_crawled: usize,
    /// Listings skipped after a fetch failure
    pub failures: Vec<ListingFetchFailed>,
    /// Documents written, counting a post once per listing it appeared in
    pub posts_saved: u64,
    /// Posts that could not be written to the cache
    pub posts_failed: u64,
    /// Distinct posts stored after the pass
    pub cached_posts: u64,
}

/// Crawls every listing in order, caching each post as it arrives.
///
/// Deduplication is implicit: the cache keys by id, so a post appearing
/// in several listings is written once per appearance and exactly one
/// document remains, with the last listing in the fixed order winning any
/// same-session field differences. A failed listing is logged and skipped
/// without aborting the rest of the pass.
pub async fn fetch_posts(
    api: &dyn RedditApi,
    cache: &ContentCache,
    subreddit: &str,
    listings: &[ListingSpec],
    shutdown: &ShutdownFlag,
) -> CacheResult<PostsSummary> {
    let mut summary = PostsSummary {
        listings_crawled: 0,
        failures: Vec::new(),
        posts_saved: 0,
        posts_failed: 0,
        cached_posts: 0,
    };

    for listing in listings {
        if shutdown.is_set() {
            tracing::info!("Stopping posts pass before listing {}", listing);
            break;
        }

        let posts = match api.listing_posts(subreddit, listing).await {
            Ok(posts) => posts,
            Err(source) => {
                let failure = ListingFetchFailed {
                    listing: listing.to_string(),
                    source,
                };
                tracing::warn!("{}", failure);
                summary.failures.push(failure);
                continue;
            }
        };

        tracing::info!("Listing {} returned {} posts", listing, posts.len());
        summary.listings_crawled += 1;

        for post in &posts {
            match cache.put_post(post) {
                Ok(()) => summary.posts_saved += 1,
                Err(err) => {
                    tracing::warn!("Failed to cache post {}: {}", post.id, err);
                    summary.posts_failed += 1;
                }
            }
        }
    }

    summary.cached_posts = cache.count(Partition::Posts)?;
    Ok(summary)
}

/// Outcome of one update pass
#[derive(Debug)]
pub struct UpdateSummary {
    /// Cached posts submitted for refresh
    pub posts_checked: u64,
    /// Posts the remote returned and the cache overwrote
    pub posts_updated: u64,
    /// Posts the remote no longer returns; cached copies are kept
    pub posts_missing: u64,
    /// Id batches that failed to fetch
    pub batches_failed: u64,
    /// Posts that could not be written back
    pub posts_failed: u64,
    /// Cached documents skipped because they could not be read
    pub documents_skipped: u64,
}

/// Re-fetches every cached post by id and overwrites its document.
///
/// Ids the remote no longer recognizes simply stay at their cached
/// snapshot. A failed batch is logged and skipped; its posts remain
/// eligible on the next run.
pub async fn update_posts(
    api: &dyn RedditApi,
    cache: &ContentCache,
    shutdown: &ShutdownFlag,
) -> CacheResult<UpdateSummary> {
    let mut summary = UpdateSummary {
        posts_checked: 0,
        posts_updated: 0,
        posts_missing: 0,
        batches_failed: 0,
        posts_failed: 0,
        documents_skipped: 0,
    };

    let mut ids = Vec::new();
    for document in cache.posts()? {
        match document {
            Ok(post) => ids.push(post.id),
            Err(err) => {
                tracing::warn!("Skipping unreadable post document: {}", err);
                summary.documents_skipped += 1;
            }
        }
    }

    // Directory scan order is unspecified; sort so batches are stable
    // from run to run.
    ids.sort_unstable();
    tracing::info!("Refreshing {} cached posts", ids.len());

    for batch in ids.chunks(MAX_IDS_PER_LOOKUP) {
        if shutdown.is_set() {
            tracing::info!(
                "Stopping update pass with {} posts refreshed",
                summary.posts_updated
            );
            break;
        }

        summary.posts_checked += batch.len() as u64;

        let refreshed = match api.posts_by_id(batch).await {
            Ok(posts) => posts,
            Err(err) => {
                tracing::warn!("Failed to refresh a batch of {} posts: {}", batch.len(), err);
                summary.batches_failed += 1;
                continue;
            }
        };

        summary.posts_missing += batch.len().saturating_sub(refreshed.len()) as u64;

        for post in &refreshed {
            match cache.put_post(post) {
                Ok(()) => summary.posts_updated += 1,
                Err(err) => {
                    tracing::warn!("Failed to overwrite post {}: {}", post.id, err);
                    summary.posts_failed += 1;
                }
            }
        }
    }

    if summary.posts_missing > 0 {
        tracing::info!(
            "{} posts are no longer returned by the remote; cached copies kept",
            summary.posts_missing
        );
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::testing::{test_comment, test_post, ScriptedApi};
    use crate::model::PostRecord;
    use tempfile::tempdir;

    fn stored_posts(cache: &ContentCache) -> Vec<PostRecord> {
        cache
            .posts()
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_seen_index_groups_comments_by_post() {
        let dir = tempdir().unwrap();
        let cache = ContentCache::open(dir.path()).unwrap();

        cache.put_comment(&test_comment("c1", "p1")).unwrap();
        cache.put_comment(&test_comment("c2", "p1")).unwrap();
        cache.put_comment(&test_comment("c3", "p1")).unwrap();

        let index = SeenIndex::build(&cache).unwrap();

        assert!(index.is_seen("p1"));
        assert!(!index.is_seen("p2"));
        assert_eq!(index.comment_count("p1"), 3);
        assert_eq!(index.comment_count("p2"), 0);
        assert_eq!(index.seen_posts(), 1);
    }

    #[test]
    fn test_seen_index_skips_malformed_documents() {
        let dir = tempdir().unwrap();
        let cache = ContentCache::open(dir.path()).unwrap();

        cache.put_comment(&test_comment("c1", "p1")).unwrap();
        std::fs::write(dir.path().join("comments").join("bad.json"), b"{ nope").unwrap();

        let index = SeenIndex::build(&cache).unwrap();
        assert!(index.is_seen("p1"));
        assert_eq!(index.seen_posts(), 1);
    }

    #[tokio::test]
    async fn test_fetch_posts_dedups_across_listings() {
        let dir = tempdir().unwrap();
        let cache = ContentCache::open(dir.path()).unwrap();
        let api = ScriptedApi::new();

        // The same post shows up in both listings with different scores;
        // the later listing must win.
        api.script_listing(
            &ListingSpec::New,
            Ok(vec![test_post("abc123", 10), test_post("def456", 5)]),
        );
        api.script_listing(&ListingSpec::Hot, Ok(vec![test_post("abc123", 42)]));

        let listings = vec![ListingSpec::New, ListingSpec::Hot];
        let summary = fetch_posts(&api, &cache, "test", &listings, &ShutdownFlag::new())
            .await
            .unwrap();

        assert_eq!(summary.listings_crawled, 2);
        assert!(summary.failures.is_empty());
        assert_eq!(summary.posts_saved, 3);
        assert_eq!(summary.cached_posts, 2);

        let posts = stored_posts(&cache);
        let winner = posts.iter().find(|p| p.id == "abc123").unwrap();
        assert_eq!(winner.score, 42);
    }

    #[tokio::test]
    async fn test_fetch_posts_isolates_listing_failure() {
        let dir = tempdir().unwrap();
        let cache = ContentCache::open(dir.path()).unwrap();
        let api = ScriptedApi::new();

        api.script_listing(&ListingSpec::New, Err(ScriptedApi::unavailable()));
        api.script_listing(&ListingSpec::Hot, Ok(vec![test_post("zzz", 1)]));

        let listings = vec![ListingSpec::New, ListingSpec::Hot];
        let summary = fetch_posts(&api, &cache, "test", &listings, &ShutdownFlag::new())
            .await
            .unwrap();

        assert_eq!(summary.listings_crawled, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].listing, "new");
        assert_eq!(summary.cached_posts, 1);
        assert_eq!(stored_posts(&cache)[0].id, "zzz");
    }

    #[tokio::test]
    async fn test_fetch_posts_honors_shutdown() {
        let dir = tempdir().unwrap();
        let cache = ContentCache::open(dir.path()).unwrap();
        // No scripted responses: any listing call would panic.
        let api = ScriptedApi::new();

        let shutdown = ShutdownFlag::new();
        shutdown.set();

        let listings = vec![ListingSpec::New];
        let summary = fetch_posts(&api, &cache, "test", &listings, &shutdown)
            .await
            .unwrap();

        assert_eq!(summary.listings_crawled, 0);
        assert_eq!(summary.posts_saved, 0);
    }

    #[tokio::test]
    async fn test_update_posts_overwrites_and_keeps_missing() {
        let dir = tempdir().unwrap();
        let cache = ContentCache::open(dir.path()).unwrap();
        let api = ScriptedApi::new();

        cache.put_post(&test_post("p1", 1)).unwrap();
        cache.put_post(&test_post("p2", 2)).unwrap();

        // Only p1 comes back; p2 has been removed remotely.
        api.script_lookup(Ok(vec![test_post("p1", 99)]));

        let summary = update_posts(&api, &cache, &ShutdownFlag::new())
            .await
            .unwrap();

        assert_eq!(summary.posts_checked, 2);
        assert_eq!(summary.posts_updated, 1);
        assert_eq!(summary.posts_missing, 1);

        let calls = api.lookup_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["p1".to_string(), "p2".to_string()]);
        drop(calls);

        let posts = stored_posts(&cache);
        assert_eq!(posts.iter().find(|p| p.id == "p1").unwrap().score, 99);
        assert_eq!(posts.iter().find(|p| p.id == "p2").unwrap().score, 2);
    }

    #[tokio::test]
    async fn test_update_posts_tolerates_surplus_lookup_results() {
        let dir = tempdir().unwrap();
        let cache = ContentCache::open(dir.path()).unwrap();
        let api = ScriptedApi::new();

        cache.put_post(&test_post("p1", 1)).unwrap();
        // The remote answers with more records than were asked for.
        api.script_lookup(Ok(vec![test_post("p1", 5), test_post("p2", 9)]));

        let summary = update_posts(&api, &cache, &ShutdownFlag::new())
            .await
            .unwrap();

        assert_eq!(summary.posts_checked, 1);
        assert_eq!(summary.posts_missing, 0);
        assert_eq!(summary.posts_updated, 2);
    }

    #[tokio::test]
    async fn test_update_posts_isolates_batch_failure() {
        let dir = tempdir().unwrap();
        let cache = ContentCache::open(dir.path()).unwrap();
        let api = ScriptedApi::new();

        cache.put_post(&test_post("p1", 1)).unwrap();
        api.script_lookup(Err(ScriptedApi::unavailable()));

        let summary = update_posts(&api, &cache, &ShutdownFlag::new())
            .await
            .unwrap();

        assert_eq!(summary.batches_failed, 1);
        assert_eq!(summary.posts_updated, 0);
        // The cached snapshot is untouched.
        assert_eq!(stored_posts(&cache)[0].score, 1);
    }
}
