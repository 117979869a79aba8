//! Remote content API access
//!
//! This module covers everything between the crawl passes and the wire:
//! - The listing catalogue the posts pass walks
//! - Decoding of the API's kind/data envelope format
//! - A paced HTTP client implementing the `RedditApi` capability

mod api;
mod client;
mod listing;
mod wire;

pub use api::{Expansion, RedditApi, MAX_IDS_PER_LOOKUP};
pub use client::RedditClient;
pub use listing::{default_listings, ListingSpec, TimeWindow};

use thiserror::Error;

/// Errors surfaced by the remote API capability
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure reaching the remote
    #[error("Remote API unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    /// The remote answered with an unexpected HTTP status
    #[error("Remote returned HTTP {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// A comment tree was too large to expand in one pass
    #[error("Result set too large to expand in one pass")]
    ResultSetTooLarge,

    /// The response body did not match the expected wire format
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    /// A request URL could not be assembled
    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type ApiResult<T> = Result<T, ApiError>;
