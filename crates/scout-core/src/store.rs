//! The result store: a durable key-value mapping from task slug to the
//! latest stored result.
//!
//! The contract is deliberately small: `put` and `get` with read-after-write
//! consistency for a single key from a single writer's perspective. No
//! transactions, no secondary indices, no TTL. Writes are unconditional
//! overwrites; last write wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::registry::is_valid_slug;
use crate::result::StoredResult;

/// Durable latest-result-per-slug store.
#[async_trait]
pub trait ResultStore: Send + Sync + 'static {
    /// Returns the stored result for `slug`, if any.
    async fn get(&self, slug: &str) -> Result<Option<StoredResult>>;

    /// Overwrites the stored result for `slug`.
    async fn put(&self, slug: &str, result: &StoredResult) -> Result<()>;
}

/// In-memory result store for tests and debug deployments.
///
/// Thread-safe via `RwLock`. Not durable across restarts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredResult>>,
}

impl MemoryStore {
    /// Creates a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn get(&self, slug: &str) -> Result<Option<StoredResult>> {
        let entries = self.entries.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;
        Ok(entries.get(slug).cloned())
    }

    async fn put(&self, slug: &str, result: &StoredResult) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;
        entries.insert(slug.to_string(), result.clone());
        Ok(())
    }
}

/// Filesystem-backed result store: one JSON document per slug.
///
/// Writes go to a temporary file first and are published with an atomic
/// rename, so readers never observe a torn document. Slugs are validated
/// before being used as file names.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, slug: &str) -> Result<PathBuf> {
        if !is_valid_slug(slug) {
            return Err(Error::InvalidInput(format!(
                "invalid store key {slug:?}: expected a task slug"
            )));
        }
        Ok(self.root.join(format!("{slug}.json")))
    }
}

#[async_trait]
impl ResultStore for FsStore {
    async fn get(&self, slug: &str) -> Result<Option<StoredResult>> {
        let path = self.entry_path(slug)?;
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::storage_with_source(
                    format!("failed to read {}", path.display()),
                    e,
                ));
            }
        };

        let stored = serde_json::from_slice(&data).map_err(|e| Error::Serialization {
            message: format!("corrupt stored result {}: {e}", path.display()),
        })?;
        Ok(Some(stored))
    }

    async fn put(&self, slug: &str, result: &StoredResult) -> Result<()> {
        let path = self.entry_path(slug)?;
        let data = serde_json::to_vec_pretty(result).map_err(|e| Error::Serialization {
            message: format!("failed to encode stored result for {slug}: {e}"),
        })?;

        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            Error::storage_with_source(
                format!("failed to create store directory {}", self.root.display()),
                e,
            )
        })?;

        let tmp = self.root.join(format!("{slug}.json.tmp"));
        tokio::fs::write(&tmp, &data).await.map_err(|e| {
            Error::storage_with_source(format!("failed to write {}", tmp.display()), e)
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            Error::storage_with_source(format!("failed to publish {}", path.display()), e)
        })?;

        Ok(())
    }
}
