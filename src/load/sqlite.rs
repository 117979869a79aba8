//! SQLite loading of the cached documents

use crate::cache::ContentCache;
use crate::load::transform::{created_hour, decode_base36};
use crate::load::LoadResult;
use rusqlite::{params, Connection};
use std::path::Path;

/// Analysis schema, rebuilt from scratch on every load
///
/// Dropping first makes a load a full replacement: rows for documents
/// that have left the cache do not linger from earlier runs. The id
/// columns carry no uniqueness constraint; distinct cache keys can
/// decode to the same integer and both rows belong in the output.
const SCHEMA: &str = "
    DROP TABLE IF EXISTS posts;
    DROP TABLE IF EXISTS comments;

    CREATE TABLE posts (
        id INTEGER,
        title TEXT NOT NULL,
        selftext TEXT NOT NULL,
        num_comments INTEGER NOT NULL,
        score INTEGER NOT NULL,
        created TEXT NOT NULL
    );

    CREATE TABLE comments (
        id INTEGER,
        body TEXT NOT NULL,
        score INTEGER NOT NULL,
        created TEXT NOT NULL
    );
";

/// Counts from one load run
#[derive(Debug)]
pub struct LoadSummary {
    pub posts_loaded: u64,
    pub comments_loaded: u64,
    /// Documents skipped because they could not be read or transformed
    pub documents_skipped: u64,
}

/// Writes the cache into a SQLite analysis database
pub struct Loader {
    conn: Connection,
}

impl Loader {
    /// Opens (or creates) the database file at `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(Loader)` - Successfully opened/created database
    /// * `Err(LoadError)` - Failed to open database
    pub fn open(path: &Path) -> LoadResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> LoadResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Loads every cached document into fresh `posts` and `comments`
    /// tables, inside a single transaction.
    ///
    /// Ids are stored in their decoded integer form and creation times as
    /// report-local timestamps truncated to the hour. A document that
    /// cannot be read or transformed is logged and skipped rather than
    /// failing the load.
    pub fn load(&mut self, cache: &ContentCache) -> LoadResult<LoadSummary> {
        let mut summary = LoadSummary {
            posts_loaded: 0,
            comments_loaded: 0,
            documents_skipped: 0,
        };

        self.conn.execute_batch(SCHEMA)?;
        let tx = self.conn.transaction()?;

        {
            let mut insert_post = tx.prepare(
                "INSERT INTO posts (id, title, selftext, num_comments, score, created)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;

            for document in cache.posts()? {
                let post = match document {
                    Ok(post) => post,
                    Err(err) => {
                        tracing::warn!("Skipping unreadable post document: {}", err);
                        summary.documents_skipped += 1;
                        continue;
                    }
                };

                let key = match decode_base36(&post.id) {
                    Ok(key) => key,
                    Err(err) => {
                        tracing::warn!("Skipping post {} with undecodable id: {}", post.id, err);
                        summary.documents_skipped += 1;
                        continue;
                    }
                };

                let created = match created_hour(post.created) {
                    Some(created) => created,
                    None => {
                        tracing::warn!(
                            "Skipping post {} with out-of-range creation time {}",
                            post.id,
                            post.created
                        );
                        summary.documents_skipped += 1;
                        continue;
                    }
                };

                insert_post.execute(params![
                    key,
                    post.title,
                    post.selftext,
                    post.num_comments,
                    post.score,
                    created,
                ])?;
                summary.posts_loaded += 1;
            }

            let mut insert_comment = tx.prepare(
                "INSERT INTO comments (id, body, score, created) VALUES (?1, ?2, ?3, ?4)",
            )?;

            for document in cache.comments()? {
                let comment = match document {
                    Ok(comment) => comment,
                    Err(err) => {
                        tracing::warn!("Skipping unreadable comment document: {}", err);
                        summary.documents_skipped += 1;
                        continue;
                    }
                };

                let key = match decode_base36(&comment.id) {
                    Ok(key) => key,
                    Err(err) => {
                        tracing::warn!(
                            "Skipping comment {} with undecodable id: {}",
                            comment.id,
                            err
                        );
                        summary.documents_skipped += 1;
                        continue;
                    }
                };

                let created = match created_hour(comment.created) {
                    Some(created) => created,
                    None => {
                        tracing::warn!(
                            "Skipping comment {} with out-of-range creation time {}",
                            comment.id,
                            comment.created
                        );
                        summary.documents_skipped += 1;
                        continue;
                    }
                };

                insert_comment.execute(params![key, comment.body, comment.score, created])?;
                summary.comments_loaded += 1;
            }
        }

        tx.commit()?;
        Ok(summary)
    }
}
