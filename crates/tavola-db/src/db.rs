//! Document store handle and collection operations.

use std::path::Path;
use std::sync::Arc;

use redb::backends::InMemoryBackend;
use redb::{Database, ReadableTable, TableDefinition, TableError};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::{DbError, Document, Documents, Filter};

/// Each collection is a redb table of id -> JSON bytes.
fn table(collection: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(collection)
}

/// Embedded document database.
///
/// Documents live in named collections, ordered by id. Cloning a `Db` shares
/// the same database.
#[derive(Clone)]
pub struct Db {
    db: Arc<Database>,
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db").finish_non_exhaustive()
    }
}

impl Db {
    /// Open a fresh, empty in-memory database.
    ///
    /// # Example
    ///
    /// ```rust
    /// let db = tavola_db::Db::open_default().unwrap();
    /// db.insert("commands", "c1", &serde_json::json!({ "code": 42 })).unwrap();
    /// assert_eq!(db.count("commands", None).unwrap(), 1);
    /// ```
    pub fn open_default() -> Result<Self, DbError> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open (or create) a database file at `path`.
    ///
    /// The parent directory is created if missing. A file can only be open
    /// once per process; share the returned handle by cloning it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DbError::OpenError(format!("{}: {}", parent.display(), e)))?;
        }
        let db = Database::create(path)?;
        info!(path = %path.display(), "opened document store");
        Ok(Self { db: Arc::new(db) })
    }

    /// Insert a new document. Fails if the id is already taken.
    pub fn insert<T: Serialize>(&self, collection: &str, id: &str, value: &T) -> Result<(), DbError> {
        let bytes = serde_json::to_vec(value)?;
        let txn = self.db.begin_write()?;
        {
            let mut docs = txn.open_table(table(collection))?;
            if docs.get(id)?.is_some() {
                return Err(DbError::DuplicateId {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            }
            docs.insert(id, bytes.as_slice())?;
        }
        txn.commit()?;
        debug!(collection, id, "document inserted");
        Ok(())
    }

    /// Insert or overwrite a document.
    pub fn upsert<T: Serialize>(&self, collection: &str, id: &str, value: &T) -> Result<(), DbError> {
        let bytes = serde_json::to_vec(value)?;
        let txn = self.db.begin_write()?;
        {
            let mut docs = txn.open_table(table(collection))?;
            docs.insert(id, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Fetch one document by id.
    pub fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>, DbError> {
        let txn = self.db.begin_read()?;
        let docs = match txn.open_table(table(collection)) {
            Ok(docs) => docs,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let Some(guard) = docs.get(id)? else {
            return Ok(None);
        };
        let value = serde_json::from_slice(guard.value())?;
        Ok(Some(value))
    }

    /// Return the documents matching `filter` (all documents when `None`).
    pub fn find(&self, collection: &str, filter: Option<&Filter>) -> Result<Documents, DbError> {
        let docs = self
            .scan(collection)?
            .into_iter()
            .filter(|d| filter.map(|f| f.matches(d)).unwrap_or(true))
            .collect();
        Ok(Documents::new(docs))
    }

    /// Find and deserialize matching documents.
    pub fn find_as<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: Option<&Filter>,
    ) -> Result<Vec<T>, DbError> {
        self.find(collection, filter)?.deserialize_all()
    }

    /// Find exactly one document; `NotFound` when nothing matches.
    pub fn find_one<T: DeserializeOwned>(&self, collection: &str, filter: &Filter) -> Result<T, DbError> {
        self.find_optional(collection, filter)?.ok_or(DbError::NotFound)
    }

    /// Find the first matching document, if any.
    pub fn find_optional<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<T>, DbError> {
        let result = self.find(collection, Some(filter))?;
        match result.first() {
            Some(doc) => Ok(Some(doc.deserialize()?)),
            None => Ok(None),
        }
    }

    /// Read-modify-write a document in one transaction and return the new value.
    pub fn update<T, F>(&self, collection: &str, id: &str, f: F) -> Result<T, DbError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T),
    {
        let txn = self.db.begin_write()?;
        let value = {
            let mut docs = txn.open_table(table(collection))?;
            let mut value: T = match docs.get(id)? {
                Some(guard) => serde_json::from_slice(guard.value())?,
                None => return Err(DbError::NotFound),
            };
            f(&mut value);
            let bytes = serde_json::to_vec(&value)?;
            docs.insert(id, bytes.as_slice())?;
            value
        };
        txn.commit()?;
        Ok(value)
    }

    /// Delete a document. Returns whether it existed.
    pub fn delete(&self, collection: &str, id: &str) -> Result<bool, DbError> {
        let txn = self.db.begin_write()?;
        let existed = {
            let mut docs = txn.open_table(table(collection))?;
            let removed = docs.remove(id)?.is_some();
            removed
        };
        txn.commit()?;
        Ok(existed)
    }

    /// Count documents matching `filter` (all when `None`).
    pub fn count(&self, collection: &str, filter: Option<&Filter>) -> Result<usize, DbError> {
        Ok(self.find(collection, filter)?.len())
    }

    fn scan(&self, collection: &str) -> Result<Vec<Document>, DbError> {
        let txn = self.db.begin_read()?;
        let docs = match txn.open_table(table(collection)) {
            Ok(docs) => docs,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        for entry in docs.iter()? {
            let (key, value) = entry?;
            out.push(Document::new(key.value(), serde_json::from_slice(value.value())?));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Ticket {
        code: u32,
        confirmed: bool,
    }

    #[test]
    fn test_insert_and_get() {
        let db = Db::open_default().unwrap();
        db.insert("commands", "c1", &Ticket { code: 7, confirmed: false })
            .unwrap();

        let ticket: Option<Ticket> = db.get("commands", "c1").unwrap();
        assert_eq!(ticket, Some(Ticket { code: 7, confirmed: false }));
        assert_eq!(db.get::<Ticket>("commands", "missing").unwrap(), None);
        assert_eq!(db.get::<Ticket>("other", "c1").unwrap(), None);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let db = Db::open_default().unwrap();
        let t = Ticket { code: 1, confirmed: false };
        db.insert("commands", "c1", &t).unwrap();
        let err = db.insert("commands", "c1", &t).unwrap_err();
        assert!(matches!(err, DbError::DuplicateId { .. }));
    }

    #[test]
    fn test_find_by_filter() {
        let db = Db::open_default().unwrap();
        for (id, code) in [("a", 1), ("b", 2), ("c", 2)] {
            db.insert("commands", id, &Ticket { code, confirmed: false })
                .unwrap();
        }

        let filter = Filter::eq("code", 2);
        assert_eq!(db.count("commands", Some(&filter)).unwrap(), 2);
        assert_eq!(db.count("commands", None).unwrap(), 3);

        let found: Ticket = db.find_one("commands", &Filter::eq("code", 1)).unwrap();
        assert_eq!(found.code, 1);
        assert!(matches!(
            db.find_one::<Ticket>("commands", &Filter::eq("code", 9)),
            Err(DbError::NotFound)
        ));
    }

    #[test]
    fn test_update_and_delete() {
        let db = Db::open_default().unwrap();
        db.insert("commands", "c1", &Ticket { code: 5, confirmed: false })
            .unwrap();

        let updated: Ticket = db
            .update("commands", "c1", |t: &mut Ticket| t.confirmed = true)
            .unwrap();
        assert!(updated.confirmed);
        assert!(db.get::<Ticket>("commands", "c1").unwrap().unwrap().confirmed);

        assert!(db.delete("commands", "c1").unwrap());
        assert!(!db.delete("commands", "c1").unwrap());
        assert!(!db.delete("nothing", "c1").unwrap());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let path = std::env::temp_dir().join(format!(
            "tavola-db-reopen-{}-{}.redb",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        {
            let db = Db::open(&path).unwrap();
            db.insert("commands", "c1", &Ticket { code: 42, confirmed: true })
                .unwrap();
        }

        let db = Db::open(&path).unwrap();
        let found: Ticket = db.find_one("commands", &Filter::eq("code", 42)).unwrap();
        assert!(found.confirmed);
        drop(db);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_upsert_overwrites() {
        let db = Db::open_default().unwrap();
        db.upsert("codes", "+33600", &1234u32).unwrap();
        db.upsert("codes", "+33600", &9876u32).unwrap();
        assert_eq!(db.get::<u32>("codes", "+33600").unwrap(), Some(9876));
        assert_eq!(db.count("codes", None).unwrap(), 1);
    }
}
