use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use storegate_auth::AuthError;

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentStoreError {
    #[error("document not found")]
    NotFound,

    #[error("document already exists")]
    AlreadyExists,

    /// Transient network/infrastructure failure, including timeouts.
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    /// A stored document did not match the expected shape.
    #[error("document (de)serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DocumentStoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}

impl From<DocumentStoreError> for AuthError {
    fn from(value: DocumentStoreError) -> Self {
        match value {
            DocumentStoreError::NotFound => AuthError::NotFound,
            DocumentStoreError::AlreadyExists => AuthError::AlreadyExists,
            DocumentStoreError::Unavailable(msg) => AuthError::AdapterUnavailable(msg),
            DocumentStoreError::Serialization(msg) => AuthError::Internal(msg),
        }
    }
}

/// Collection/key document storage.
///
/// Per-document read-after-write consistency is assumed; nothing stronger.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point lookup. `Ok(None)` when the key is absent.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, DocumentStoreError>;

    /// Insert a new document; `AlreadyExists` if the key is taken.
    ///
    /// This is the store's only conditional write and doubles as a
    /// compare-and-swap on "key absent".
    async fn create(&self, collection: &str, key: &str, doc: Document) -> Result<(), DocumentStoreError>;

    /// Unconditional insert-or-replace.
    async fn set(&self, collection: &str, key: &str, doc: Document) -> Result<(), DocumentStoreError>;

    /// Shallow-merge `fields` into an existing document and return the result.
    async fn update(
        &self,
        collection: &str,
        key: &str,
        fields: Document,
    ) -> Result<Document, DocumentStoreError>;

    /// Remove a document; `NotFound` if absent.
    async fn delete(&self, collection: &str, key: &str) -> Result<(), DocumentStoreError>;

    /// Full scan of a collection as `(key, document)` pairs.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, DocumentStoreError>;

    /// Equality query on a top-level field.
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Document)>, DocumentStoreError>;

    async fn is_empty(&self, collection: &str) -> Result<bool, DocumentStoreError> {
        Ok(self.list(collection).await?.is_empty())
    }
}
