//! Timeout decorators for the external adapters.
//!
//! Every call to the document store or identity provider is bounded by a
//! caller-supplied deadline. An elapsed deadline is reported as the adapter's
//! `Unavailable` error, so it can only ever become a 5xx response and never an
//! authentication or authorization decision.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use storegate_auth::Identity;
use storegate_core::UserId;

use crate::document_store::{Document, DocumentStore, DocumentStoreError};
use crate::identity::{IdentityError, IdentityProvider};

async fn within<T, E>(
    limit: Duration,
    operation: &'static str,
    fut: impl Future<Output = Result<T, E>>,
    on_timeout: impl FnOnce(String) -> E,
) -> Result<T, E> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, timeout_ms = limit.as_millis() as u64, "adapter call timed out");
            Err(on_timeout(format!("{operation} timed out after {}ms", limit.as_millis())))
        }
    }
}

/// [`DocumentStore`] wrapper that bounds each call by a deadline.
#[derive(Clone)]
pub struct BoundedStore {
    inner: Arc<dyn DocumentStore>,
    limit: Duration,
}

impl BoundedStore {
    pub fn new(inner: Arc<dyn DocumentStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl DocumentStore for BoundedStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, DocumentStoreError> {
        within(self.limit, "store.get", self.inner.get(collection, key), DocumentStoreError::Unavailable).await
    }

    async fn create(&self, collection: &str, key: &str, doc: Document) -> Result<(), DocumentStoreError> {
        within(
            self.limit,
            "store.create",
            self.inner.create(collection, key, doc),
            DocumentStoreError::Unavailable,
        )
        .await
    }

    async fn set(&self, collection: &str, key: &str, doc: Document) -> Result<(), DocumentStoreError> {
        within(self.limit, "store.set", self.inner.set(collection, key, doc), DocumentStoreError::Unavailable).await
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        fields: Document,
    ) -> Result<Document, DocumentStoreError> {
        within(
            self.limit,
            "store.update",
            self.inner.update(collection, key, fields),
            DocumentStoreError::Unavailable,
        )
        .await
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), DocumentStoreError> {
        within(self.limit, "store.delete", self.inner.delete(collection, key), DocumentStoreError::Unavailable).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, DocumentStoreError> {
        within(self.limit, "store.list", self.inner.list(collection), DocumentStoreError::Unavailable).await
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Document)>, DocumentStoreError> {
        within(
            self.limit,
            "store.find_by_field",
            self.inner.find_by_field(collection, field, value),
            DocumentStoreError::Unavailable,
        )
        .await
    }

    async fn is_empty(&self, collection: &str) -> Result<bool, DocumentStoreError> {
        within(self.limit, "store.is_empty", self.inner.is_empty(collection), DocumentStoreError::Unavailable).await
    }
}

/// [`IdentityProvider`] wrapper that bounds each call by a deadline.
#[derive(Clone)]
pub struct BoundedIdentityProvider {
    inner: Arc<dyn IdentityProvider>,
    limit: Duration,
}

impl BoundedIdentityProvider {
    pub fn new(inner: Arc<dyn IdentityProvider>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl IdentityProvider for BoundedIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        within(
            self.limit,
            "identity.create_account",
            self.inner.create_account(email, password),
            IdentityError::Unavailable,
        )
        .await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        within(
            self.limit,
            "identity.sign_in",
            self.inner.sign_in(email, password),
            IdentityError::Unavailable,
        )
        .await
    }

    async fn sign_out(&self, uid: &UserId) -> Result<(), IdentityError> {
        within(self.limit, "identity.sign_out", self.inner.sign_out(uid), IdentityError::Unavailable).await
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        within(
            self.limit,
            "identity.send_password_reset",
            self.inner.send_password_reset(email),
            IdentityError::Unavailable,
        )
        .await
    }

    async fn update_display_name(&self, uid: &UserId, name: &str) -> Result<Identity, IdentityError> {
        within(
            self.limit,
            "identity.update_display_name",
            self.inner.update_display_name(uid, name),
            IdentityError::Unavailable,
        )
        .await
    }
}
