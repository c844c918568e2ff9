//! Document and filter types.

use crate::DbError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A stored JSON document with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: String,
    body: Value,
}

impl Document {
    /// Create a new document.
    pub fn new(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }

    /// Document id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw JSON body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Look up a field by dot-separated path, e.g. `"payment.status"`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.body, |value, segment| value.get(segment))
    }

    /// Try to deserialize the document into a type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, DbError> {
        serde_json::from_value(self.body.clone()).map_err(|e| DbError::DeserializeError(e.to_string()))
    }
}

/// A predicate over document fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field at path equals the value.
    Eq(String, Value),
    /// Field at path differs from the value (or is missing).
    Ne(String, Value),
    /// Field at path exists and is not null.
    Exists(String),
    /// All sub-filters match.
    And(Vec<Filter>),
}

impl Filter {
    /// Equality on a field path.
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(path.into(), value.into())
    }

    /// Inequality on a field path.
    pub fn ne(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ne(path.into(), value.into())
    }

    /// Field presence.
    pub fn exists(path: impl Into<String>) -> Self {
        Filter::Exists(path.into())
    }

    /// Combine with another filter.
    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    /// Check the filter against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Eq(path, value) => doc.get(path) == Some(value),
            Filter::Ne(path, value) => doc.get(path) != Some(value),
            Filter::Exists(path) => doc.get(path).map(|v| !v.is_null()).unwrap_or(false),
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
        }
    }
}

/// Documents returned by a query.
#[derive(Debug, Clone, Default)]
pub struct Documents {
    /// The matched documents, ordered by id.
    pub docs: Vec<Document>,
}

impl Documents {
    /// Create a new result set.
    pub fn new(docs: Vec<Document>) -> Self {
        Self { docs }
    }

    /// Get the number of documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Check if the result is empty.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Get the first document.
    pub fn first(&self) -> Option<&Document> {
        self.docs.first()
    }

    /// Iterate over the documents.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.docs.iter()
    }

    /// Deserialize all documents into a vector of a type.
    pub fn deserialize_all<T: DeserializeOwned>(&self) -> Result<Vec<T>, DbError> {
        self.docs.iter().map(|doc| doc.deserialize()).collect()
    }
}
