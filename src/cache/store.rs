//! Directory-backed cache implementation
//!
//! One JSON document per record, named `<id>.json` inside the partition
//! directory. Keys are derived solely from the record id, which makes every
//! write naturally idempotent: re-saving a record replaces the prior
//! snapshot instead of duplicating it.

use crate::cache::{CacheError, CacheResult, Partition};
use crate::model::{CommentRecord, PostRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, ReadDir};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Sequence for unique temporary file names within the process
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Directory-backed content cache for one subreddit
///
/// Lives at `<root>/posts` and `<root>/comments`. All operations are
/// synchronous filesystem mutations.
pub struct ContentCache {
    posts_dir: PathBuf,
    comments_dir: PathBuf,
}

impl ContentCache {
    /// Opens the cache rooted at `root`, creating both partition
    /// directories if they do not exist yet.
    ///
    /// # Arguments
    ///
    /// * `root` - Cache root directory, typically `<cache-dir>/<subreddit>`
    ///
    /// # Returns
    ///
    /// * `Ok(ContentCache)` - Cache is ready for reads and writes
    /// * `Err(CacheError)` - A partition directory could not be created
    pub fn open(root: impl AsRef<Path>) -> CacheResult<Self> {
        let root = root.as_ref();
        let posts_dir = root.join(Partition::Posts.dir_name());
        let comments_dir = root.join(Partition::Comments.dir_name());

        for dir in [&posts_dir, &comments_dir] {
            fs::create_dir_all(dir).map_err(|source| CacheError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }

        Ok(Self {
            posts_dir,
            comments_dir,
        })
    }

    fn partition_dir(&self, partition: Partition) -> &Path {
        match partition {
            Partition::Posts => &self.posts_dir,
            Partition::Comments => &self.comments_dir,
        }
    }

    fn document_path(&self, partition: Partition, id: &str) -> PathBuf {
        self.partition_dir(partition).join(format!("{id}.json"))
    }

    /// Checks whether a document for `id` is stored, without enumerating.
    pub fn exists(&self, partition: Partition, id: &str) -> bool {
        self.document_path(partition, id).is_file()
    }

    /// Writes or overwrites the document for this post id.
    pub fn put_post(&self, post: &PostRecord) -> CacheResult<()> {
        self.write_document(Partition::Posts, &post.id, post)
    }

    /// Writes or overwrites the document for this comment id.
    pub fn put_comment(&self, comment: &CommentRecord) -> CacheResult<()> {
        self.write_document(Partition::Comments, &comment.id, comment)
    }

    /// Serializes `value` and moves it onto `<id>.json`.
    ///
    /// The document lands in a uniquely named temporary file first and is
    /// renamed into place. Rename is atomic on a single filesystem: a crash
    /// leaves either the previous document or the new one, never a
    /// truncated mix, and concurrent writers of the same id serialize at
    /// the rename with the last write winning.
    fn write_document<T: Serialize>(
        &self,
        partition: Partition,
        id: &str,
        value: &T,
    ) -> CacheResult<()> {
        let body = serde_json::to_vec_pretty(value).map_err(|source| CacheError::Serialize {
            id: id.to_string(),
            source,
        })?;

        let dir = self.partition_dir(partition);
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = dir.join(format!(".{id}.{seq}.tmp"));

        let result = fs::write(&tmp, &body)
            .and_then(|()| fs::rename(&tmp, self.document_path(partition, id)));

        if let Err(source) = result {
            let _ = fs::remove_file(&tmp);
            return Err(CacheError::Write {
                id: id.to_string(),
                source,
            });
        }

        Ok(())
    }

    /// Enumerates every stored post document.
    ///
    /// The sequence is lazy and restartable (call again for a fresh scan);
    /// order is unspecified and must not be relied upon. Malformed
    /// documents come through as `Err` items so callers can log and skip
    /// them without aborting the scan.
    pub fn posts(&self) -> CacheResult<DocumentIter<PostRecord>> {
        DocumentIter::new(&self.posts_dir)
    }

    /// Enumerates every stored comment document; see [`Self::posts`].
    pub fn comments(&self) -> CacheResult<DocumentIter<CommentRecord>> {
        DocumentIter::new(&self.comments_dir)
    }

    /// Counts the stored documents in a partition.
    ///
    /// Computed fresh on every call by scanning the partition directory.
    /// Callers that want a single figure per crawl session take it once at
    /// session start and keep the value themselves; the cache never caches
    /// counts on their behalf.
    pub fn count(&self, partition: Partition) -> CacheResult<u64> {
        let dir = self.partition_dir(partition);
        let entries = fs::read_dir(dir).map_err(|source| CacheError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut total = 0;
        for entry in entries {
            let entry = entry.map_err(|source| CacheError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?;
            if is_document(&entry.path()) {
                total += 1;
            }
        }

        Ok(total)
    }
}

fn is_document(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Lazy iterator over one partition's documents
///
/// Yields `Ok(record)` per parseable document and `Err(CacheError)` for
/// entries that cannot be read or decoded.
pub struct DocumentIter<T> {
    dir: PathBuf,
    entries: ReadDir,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> DocumentIter<T> {
    fn new(dir: &Path) -> CacheResult<Self> {
        let entries = fs::read_dir(dir).map_err(|source| CacheError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            entries,
            _marker: PhantomData,
        })
    }
}

impl<T: DeserializeOwned> Iterator for DocumentIter<T> {
    type Item = CacheResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(source) => {
                    return Some(Err(CacheError::ReadDir {
                        path: self.dir.clone(),
                        source,
                    }))
                }
            };

            let path = entry.path();
            if !is_document(&path) {
                continue;
            }

            return Some(read_document(&path));
        }
    }
}

fn read_document<T: DeserializeOwned>(path: &Path) -> CacheResult<T> {
    let raw = fs::read(path).map_err(|source| CacheError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| CacheError::InvalidDocument {
        path: path.to_path_buf(),
        source,
    })
}
