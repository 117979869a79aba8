//! Loading the cache into SQLite for analysis
//!
//! The load step is a one-way transform: cached JSON documents become
//! rows in fresh `posts` and `comments` tables, with base-36 ids decoded
//! to integers and creation times truncated to the report-local hour.

mod sqlite;
mod transform;

pub use sqlite::{LoadSummary, Loader};
pub use transform::{created_hour, decode_base36};

use crate::cache::CacheError;
use thiserror::Error;

/// Errors that can occur while loading the cache into SQLite
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Result type alias for load operations
pub type LoadResult<T> = std::result::Result<T, LoadError>;
