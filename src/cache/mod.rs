//! Content cache for crawled records
//!
//! This module implements the directory-backed, id-keyed store of post and
//! comment documents. The cache doubles as the dedup ledger for the crawl
//! and as the system of record for the load step, so there is no
//! in-memory-only mode.

mod store;

pub use store::{ContentCache, DocumentIter};

use std::path::PathBuf;
use thiserror::Error;

/// The two disjoint key spaces of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Posts,
    Comments,
}

impl Partition {
    /// Subdirectory name holding this partition's documents
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Comments => "comments",
        }
    }
}

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to create cache directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write document {id}: {source}")]
    Write { id: String, source: std::io::Error },

    #[error("Failed to serialize document {id}: {source}")]
    Serialize {
        id: String,
        source: serde_json::Error,
    },

    #[error("Failed to read cache directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read document {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid cached document {}: {source}", path.display())]
    InvalidDocument {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
