//! Key-Value store wrapper with automatic serialization.

use std::path::Path;
use std::sync::Arc;

use redb::backends::InMemoryBackend;
use redb::{Database, ReadableTable, TableDefinition, TableError};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::CacheError;

const ENTRIES: TableDefinition<&str, &[u8]> = TableDefinition::new("entries");

/// File name used by [`Cache::open_dir`].
pub const CACHE_FILE: &str = "cache.redb";

/// Type-safe cache backed by an embedded redb database, in memory or on disk.
///
/// Provides automatic JSON serialization for any type that implements
/// `Serialize` and `DeserializeOwned`. Every write is its own transaction.
/// Cloning a `Cache` shares the underlying store.
#[derive(Clone)]
pub struct Cache {
    db: Arc<Database>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl Cache {
    /// Open a fresh in-memory store.
    ///
    /// # Example
    ///
    /// ```rust
    /// let cache = tavola_cache::Cache::open_default().unwrap();
    /// cache.set("lang", &"fr").unwrap();
    /// assert_eq!(cache.get::<String>("lang").unwrap().as_deref(), Some("fr"));
    /// ```
    pub fn open_default() -> Result<Self, CacheError> {
        let db = Database::builder()
            .create_with_backend(InMemoryBackend::new())
            .map_err(|e| CacheError::OpenError(e.to_string()))?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open the store kept in [`CACHE_FILE`] under `dir`.
    ///
    /// The directory is created if missing.
    pub fn open_dir(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|e| CacheError::OpenError(format!("{}: {}", dir.display(), e)))?;
        Self::open(dir.join(CACHE_FILE))
    }

    /// Open (or create) a store file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        let db = Database::create(path)
            .map_err(|e| CacheError::OpenError(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "opened cache");
        Ok(Self { db: Arc::new(db) })
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get_raw(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Set a value in the cache.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        let txn = self.db.begin_write().map_err(store_error)?;
        {
            let mut entries = txn.open_table(ENTRIES).map_err(store_error)?;
            entries.insert(key, bytes.as_slice()).map_err(store_error)?;
        }
        txn.commit().map_err(store_error)
    }

    /// Delete a value from the cache. Deleting a missing key is not an error.
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        let txn = self.db.begin_write().map_err(store_error)?;
        {
            let mut entries = txn.open_table(ENTRIES).map_err(store_error)?;
            entries.remove(key).map_err(store_error)?;
        }
        txn.commit().map_err(store_error)
    }

    /// Check if a key exists in the cache.
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get_raw(key)?.is_some())
    }

    /// Get all keys in the cache, sorted.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        let txn = self.db.begin_read().map_err(store_error)?;
        let entries = match txn.open_table(ENTRIES) {
            Ok(entries) => entries,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(store_error(e)),
        };

        let mut keys = Vec::new();
        for entry in entries.iter().map_err(store_error)? {
            let (key, _) = entry.map_err(store_error)?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }

    fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let txn = self.db.begin_read().map_err(store_error)?;
        let entries = match txn.open_table(ENTRIES) {
            Ok(entries) => entries,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(store_error(e)),
        };
        let bytes = entries
            .get(key)
            .map_err(store_error)?
            .map(|guard| guard.value().to_vec());
        Ok(bytes)
    }
}

fn store_error(e: impl Into<redb::Error>) -> CacheError {
    CacheError::StoreError(e.into().to_string())
}

/// Helper to build cache keys with namespacing.
///
/// # Example
///
/// ```rust
/// let key = tavola_cache::cache_key!("cart", "sess_abc");
/// assert_eq!(key, "cart:sess_abc");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}
