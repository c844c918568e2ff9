//! Database error types.

use thiserror::Error;

/// Errors that can occur when using the document store.
#[derive(Error, Debug)]
pub enum DbError {
    /// Failed to open the database.
    #[error("Failed to open database: {0}")]
    OpenError(String),

    /// A storage read or transaction failed.
    #[error("Storage error: {0}")]
    StoreError(String),

    /// A write could not be applied.
    #[error("Write failed: {0}")]
    WriteError(String),

    /// Failed to (de)serialize a document.
    #[error("Deserialization error: {0}")]
    DeserializeError(String),

    /// Inserting a document whose id is already taken.
    #[error("Duplicate id {id} in collection {collection}")]
    DuplicateId { collection: String, id: String },

    /// No document matched when one was expected.
    #[error("No document found")]
    NotFound,
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        DbError::DeserializeError(e.to_string())
    }
}

impl From<redb::DatabaseError> for DbError {
    fn from(e: redb::DatabaseError) -> Self {
        DbError::OpenError(e.to_string())
    }
}

impl From<redb::TransactionError> for DbError {
    fn from(e: redb::TransactionError) -> Self {
        DbError::StoreError(e.to_string())
    }
}

impl From<redb::TableError> for DbError {
    fn from(e: redb::TableError) -> Self {
        DbError::StoreError(e.to_string())
    }
}

impl From<redb::StorageError> for DbError {
    fn from(e: redb::StorageError) -> Self {
        DbError::StoreError(e.to_string())
    }
}

impl From<redb::CommitError> for DbError {
    fn from(e: redb::CommitError) -> Self {
        DbError::WriteError(e.to_string())
    }
}
