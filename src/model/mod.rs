//! Record types persisted by the crawler
//!
//! The two document shapes stored in the content cache, one JSON file per
//! record. Field names match the persisted snake_case document format.

mod comment;
mod post;

pub use comment::CommentRecord;
pub use post::PostRecord;

/// Author name stored when the authoring account no longer exists.
pub const DELETED_AUTHOR: &str = "[deleted]";

/// Resolves a possibly-missing author identity to the stored author field.
///
/// The remote API omits the author when the account has been deleted; the
/// sentinel is substituted here, at record construction, so downstream code
/// never deals with an absent author.
pub fn resolve_author(author: Option<String>) -> String {
    author.unwrap_or_else(|| DELETED_AUTHOR.to_string())
}
