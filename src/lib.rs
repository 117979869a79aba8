//! Subvault: an incremental subreddit archiver
//!
//! This crate crawls as many posts and comment trees for a subreddit as the
//! Reddit API will return, keeps them as an id-keyed cache of JSON documents
//! on disk, and loads the finished cache into a SQLite database for analysis.

pub mod cache;
pub mod config;
pub mod crawl;
pub mod load;
pub mod model;
pub mod reddit;

use thiserror::Error;

/// Main error type for subvault operations
#[derive(Debug, Error)]
pub enum SubvaultError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote API error: {0}")]
    Api(#[from] reddit::ApiError),

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("Load error: {0}")]
    Load(#[from] load::LoadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Result type alias for subvault operations
pub type Result<T> = std::result::Result<T, SubvaultError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cache::{ContentCache, Partition};
pub use config::Config;
pub use model::{CommentRecord, PostRecord, DELETED_AUTHOR};
pub use reddit::{ApiError, Expansion, ListingSpec, RedditApi, RedditClient};
