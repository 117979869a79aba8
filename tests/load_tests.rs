//! Integration tests for loading the cache into SQLite

use rusqlite::Connection;
use subvault::load::Loader;
use subvault::{CommentRecord, ContentCache, PostRecord};
use tempfile::tempdir;

fn cached_post(id: &str, score: i64) -> PostRecord {
    PostRecord {
        id: id.to_string(),
        author: "alice".to_string(),
        title: format!("post {id}"),
        selftext: "body text".to_string(),
        url: format!("https://example.com/{id}"),
        permalink: format!("/r/test/comments/{id}/"),
        created: 1_615_819_072,
        edited: None,
        num_comments: 3,
        score,
    }
}

fn cached_comment(id: &str, post_id: &str) -> CommentRecord {
    CommentRecord {
        id: id.to_string(),
        post_id: post_id.to_string(),
        author: "bob".to_string(),
        body: format!("comment {id}"),
        created: 1_615_819_100,
        edited: None,
        score: 1,
        permalink: format!("/r/test/comments/{post_id}/_/{id}/"),
    }
}

#[test]
fn test_load_produces_expected_rows() {
    let dir = tempdir().expect("Failed to create temp dir");
    let cache = ContentCache::open(dir.path()).expect("Failed to open cache");
    cache.put_post(&cached_post("1a", 7)).expect("Failed to seed post");
    cache
        .put_comment(&cached_comment("2b", "1a"))
        .expect("Failed to seed comment");

    let db_path = dir.path().join("test.db");
    let mut loader = Loader::open(&db_path).expect("Failed to open database");
    let summary = loader.load(&cache).expect("Load failed");

    assert_eq!(summary.posts_loaded, 1);
    assert_eq!(summary.comments_loaded, 1);
    assert_eq!(summary.documents_skipped, 0);
    drop(loader);

    let conn = Connection::open(&db_path).expect("Failed to reopen database");

    // Ids are decoded from base-36 and creation times truncated to the hour
    let (id, score, created): (i64, i64, String) = conn
        .query_row("SELECT id, score, created FROM posts", [], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .expect("Failed to read post row");
    assert_eq!(id, 46);
    assert_eq!(score, 7);
    assert_eq!(created, "2021-03-15T09:00:00");

    let (comment_id, body): (i64, String) = conn
        .query_row("SELECT id, body FROM comments", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .expect("Failed to read comment row");
    assert_eq!(comment_id, 83);
    assert_eq!(body, "comment 2b");
}

#[test]
fn test_second_load_against_existing_database() {
    let dir = tempdir().expect("Failed to create temp dir");
    let cache = ContentCache::open(dir.path()).expect("Failed to open cache");
    cache.put_post(&cached_post("1a", 7)).expect("Failed to seed post");

    let db_path = dir.path().join("test.db");
    let mut loader = Loader::open(&db_path).expect("Failed to open database");
    loader.load(&cache).expect("First load failed");

    // The post changes between loads; the reload must not duplicate it
    cache.put_post(&cached_post("1a", 50)).expect("Failed to update post");
    loader.load(&cache).expect("Second load failed");
    drop(loader);

    let conn = Connection::open(&db_path).expect("Failed to reopen database");
    let (count, score): (i64, i64) = conn
        .query_row("SELECT COUNT(*), MAX(score) FROM posts", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .expect("Failed to count posts");
    assert_eq!(count, 1);
    assert_eq!(score, 50);
}

#[test]
fn test_load_skips_unreadable_documents() {
    let dir = tempdir().expect("Failed to create temp dir");
    let cache = ContentCache::open(dir.path()).expect("Failed to open cache");
    cache.put_post(&cached_post("1a", 7)).expect("Failed to seed post");
    std::fs::write(dir.path().join("posts").join("bad.json"), b"{ nope")
        .expect("Failed to plant bad document");

    let db_path = dir.path().join("test.db");
    let mut loader = Loader::open(&db_path).expect("Failed to open database");
    let summary = loader.load(&cache).expect("Load failed");

    assert_eq!(summary.posts_loaded, 1);
    assert_eq!(summary.documents_skipped, 1);
}
