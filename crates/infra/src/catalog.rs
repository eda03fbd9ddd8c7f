//! Products collection.
//!
//! Products are opaque JSON objects: the gateway assigns the id and the
//! timestamps, everything else is stored as given.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use storegate_core::ProductId;

use crate::document_store::{Document, DocumentStore, DocumentStoreError};

pub const PRODUCTS_COLLECTION: &str = "products";

const RESERVED_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

fn strip_reserved(mut fields: Document) -> Document {
    for reserved in RESERVED_FIELDS {
        fields.remove(reserved);
    }
    fields
}

#[derive(Clone)]
pub struct ProductCatalog {
    store: Arc<dyn DocumentStore>,
}

impl ProductCatalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Value>, DocumentStoreError> {
        Ok(self
            .store
            .list(PRODUCTS_COLLECTION)
            .await?
            .into_iter()
            .map(|(_, doc)| Value::Object(doc))
            .collect())
    }

    pub async fn get(&self, id: ProductId) -> Result<Value, DocumentStoreError> {
        self.store
            .get(PRODUCTS_COLLECTION, &id.to_string())
            .await?
            .map(Value::Object)
            .ok_or(DocumentStoreError::NotFound)
    }

    pub async fn create(&self, fields: Document) -> Result<Value, DocumentStoreError> {
        let id = ProductId::new();
        let now = serde_json::to_value(Utc::now())?;

        let mut doc = strip_reserved(fields);
        doc.insert("id".to_string(), json!(id.to_string()));
        doc.insert("created_at".to_string(), now.clone());
        doc.insert("updated_at".to_string(), now);

        self.store
            .create(PRODUCTS_COLLECTION, &id.to_string(), doc.clone())
            .await?;
        Ok(Value::Object(doc))
    }

    /// Merge `fields` into an existing product.
    pub async fn update(&self, id: ProductId, fields: Document) -> Result<Value, DocumentStoreError> {
        let mut changes = strip_reserved(fields);
        changes.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);

        let merged = self
            .store
            .update(PRODUCTS_COLLECTION, &id.to_string(), changes)
            .await?;
        Ok(Value::Object(merged))
    }

    pub async fn delete(&self, id: ProductId) -> Result<(), DocumentStoreError> {
        self.store.delete(PRODUCTS_COLLECTION, &id.to_string()).await
    }
}
