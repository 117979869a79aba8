//! HTTP client for the content API
//!
//! This module handles all remote requests for the crawl passes:
//! - Building a reqwest client with the configured user agent
//! - Paginating listings with the after cursor
//! - Resolving comment continuations in bounded batches
//! - Spacing every request out of one shared pacing budget

use crate::config::Config;
use crate::model::{CommentRecord, PostRecord};
use crate::reddit::api::{Expansion, RedditApi, MAX_IDS_PER_LOOKUP};
use crate::reddit::wire::{
    flatten_forest, ListingEnvelope, MoreChildrenEnvelope, Node,
};
use crate::reddit::{ApiError, ApiResult, ListingSpec};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use url::Url;

/// Comments requested in the first page of a tree fetch
const COMMENT_PAGE_LIMIT: u32 = 500;

/// Shared request budget
///
/// Every request claims the next free slot before sending; slots are
/// spaced one interval apart no matter which worker asks, so concurrent
/// fetches share a single budget instead of multiplying it.
struct RequestPacer {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RequestPacer {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let slot = (*next).max(Instant::now());
            *next = slot + self.interval;
            slot
        };
        sleep_until(slot).await;
    }
}

/// Paced HTTP client speaking the content API's JSON wire format
pub struct RedditClient {
    http: Client,
    base_url: Url,
    pacer: RequestPacer,
    page_size: u32,
}

impl RedditClient {
    /// Builds a client from configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated application configuration
    ///
    /// # Returns
    ///
    /// * `Ok(RedditClient)` - Ready to serve the crawl passes
    /// * `Err(ApiError)` - The HTTP client could not be built or the base
    ///   URL does not parse
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(config.user_agent.header_value())
            .timeout(Duration::from_secs(config.crawler.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        let base_url = Url::parse(&config.api.base_url)?;
        let interval =
            Duration::from_millis(60_000 / u64::from(config.crawler.requests_per_minute.max(1)));

        Ok(Self {
            http,
            base_url,
            pacer: RequestPacer::new(interval),
            page_size: config.api.page_size,
        })
    }

    /// Issues one paced GET and decodes the JSON body.
    ///
    /// `oversize_is_overflow` controls whether HTTP 413 maps to
    /// `ApiError::ResultSetTooLarge`; only the comment-tree endpoints
    /// refuse oversized expansions that way.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        oversize_is_overflow: bool,
    ) -> ApiResult<T> {
        self.pacer.acquire().await;

        let url = self.base_url.join(path)?;
        tracing::debug!("GET {}", url);
        let response = self.http.get(url.clone()).query(query).send().await?;

        let status = response.status();
        if oversize_is_overflow && status == StatusCode::PAYLOAD_TOO_LARGE {
            return Err(ApiError::ResultSetTooLarge);
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    fn base_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("raw_json", "1".to_string()),
            ("limit", self.page_size.to_string()),
        ]
    }

    /// Resolves one batch of continuation ids into comment-tree nodes.
    async fn more_children(&self, post_id: &str, ids: &[String]) -> ApiResult<Vec<Node>> {
        let query = vec![
            ("raw_json", "1".to_string()),
            ("api_type", "json".to_string()),
            ("link_id", format!("t3_{post_id}")),
            ("children", ids.join(",")),
        ];

        let envelope: MoreChildrenEnvelope = self
            .get_json("/api/morechildren.json", &query, true)
            .await?;
        Ok(envelope.json.data.map(|d| d.things).unwrap_or_default())
    }
}

#[async_trait]
impl RedditApi for RedditClient {
    async fn listing_posts(
        &self,
        subreddit: &str,
        listing: &ListingSpec,
    ) -> ApiResult<Vec<PostRecord>> {
        let path = listing.request_path(subreddit);
        let mut posts = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query = self.base_query();
            query.extend(listing.query_params());
            if let Some(cursor) = after.take() {
                query.push(("after", cursor));
            }

            let page: ListingEnvelope = self.get_json(&path, &query, false).await?;
            let next = page.data.after.clone();
            let batch = page.data.into_posts();
            tracing::debug!("Listing {} page carried {} posts", listing, batch.len());

            // An exhausted listing answers with a null cursor; an empty
            // page means the same even if a cursor came back.
            let done = batch.is_empty();
            posts.extend(batch);

            match next {
                Some(cursor) if !done && !cursor.is_empty() => after = Some(cursor),
                _ => break,
            }
        }

        Ok(posts)
    }

    async fn post_comments(
        &self,
        subreddit: &str,
        post_id: &str,
        expansion: Expansion,
    ) -> ApiResult<Vec<CommentRecord>> {
        let path = format!("/r/{subreddit}/comments/{post_id}.json");
        let query = vec![
            ("raw_json", "1".to_string()),
            ("limit", COMMENT_PAGE_LIMIT.to_string()),
        ];

        // The endpoint answers with a pair of listings: the post itself,
        // then its comment forest.
        let (_head, forest): (ListingEnvelope, ListingEnvelope) =
            self.get_json(&path, &query, true).await?;

        let mut records = Vec::new();
        let mut more_ids = Vec::new();
        flatten_forest(forest.data.children, post_id, &mut records, &mut more_ids);

        match expansion {
            Expansion::None => {
                if !more_ids.is_empty() {
                    tracing::debug!(
                        "Dropping {} unexpanded comment ids for post {}",
                        more_ids.len(),
                        post_id
                    );
                }
            }
            Expansion::All => {
                while !more_ids.is_empty() {
                    let take = more_ids.len().min(MAX_IDS_PER_LOOKUP);
                    let batch: Vec<String> = more_ids.drain(..take).collect();
                    let resolved = self.more_children(post_id, &batch).await?;
                    flatten_forest(resolved, post_id, &mut records, &mut more_ids);
                }
            }
        }

        Ok(records)
    }

    async fn posts_by_id(&self, ids: &[String]) -> ApiResult<Vec<PostRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let fullnames: Vec<String> = ids.iter().map(|id| format!("t3_{id}")).collect();
        let query = vec![
            ("raw_json", "1".to_string()),
            ("id", fullnames.join(",")),
        ];

        let page: ListingEnvelope = self.get_json("/api/info.json", &query, false).await?;
        Ok(page.data.into_posts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.crawler.requests_per_minute = 60_000;
        config
    }

    #[test]
    fn test_build_client_with_defaults() {
        let client = RedditClient::new(&create_test_config());
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let mut config = create_test_config();
        config.api.base_url = "not a url".to_string();

        let result = RedditClient::new(&config);
        assert!(matches!(result, Err(ApiError::Url(_))));
    }

    #[tokio::test]
    async fn test_pacer_spaces_consecutive_requests() {
        let pacer = RequestPacer::new(Duration::from_millis(30));

        let started = std::time::Instant::now();
        pacer.acquire().await;
        pacer.acquire().await;

        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_pacer_with_zero_interval_does_not_block() {
        let pacer = RequestPacer::new(Duration::from_millis(0));
        pacer.acquire().await;
        pacer.acquire().await;
    }
}
