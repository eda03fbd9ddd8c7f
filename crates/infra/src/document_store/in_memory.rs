use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::r#trait::{Document, DocumentStore, DocumentStoreError};

type Collections = HashMap<String, BTreeMap<String, Document>>;

/// In-memory document store.
///
/// Intended for tests/dev. Can simulate an outage (`set_unavailable`) or a
/// slow backend (`set_latency`) to exercise timeout handling.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<Collections>,
    unavailable: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut guard) = self.latency.lock() {
            *guard = latency;
        }
    }

    async fn simulate_network(&self) -> Result<(), DocumentStoreError> {
        let latency = self.latency.lock().ok().and_then(|guard| *guard);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DocumentStoreError::Unavailable(
                "simulated outage".to_string(),
            ));
        }
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Collections>, DocumentStoreError> {
        self.collections
            .read()
            .map_err(|_| DocumentStoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Collections>, DocumentStoreError> {
        self.collections
            .write()
            .map_err(|_| DocumentStoreError::Unavailable("lock poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, DocumentStoreError> {
        self.simulate_network().await?;
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(key))
            .cloned())
    }

    async fn create(&self, collection: &str, key: &str, doc: Document) -> Result<(), DocumentStoreError> {
        self.simulate_network().await?;
        let mut collections = self.write()?;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(key) {
            return Err(DocumentStoreError::AlreadyExists);
        }
        docs.insert(key.to_string(), doc);
        Ok(())
    }

    async fn set(&self, collection: &str, key: &str, doc: Document) -> Result<(), DocumentStoreError> {
        self.simulate_network().await?;
        let mut collections = self.write()?;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), doc);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        fields: Document,
    ) -> Result<Document, DocumentStoreError> {
        self.simulate_network().await?;
        let mut collections = self.write()?;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(key))
            .ok_or(DocumentStoreError::NotFound)?;

        for (field, value) in fields {
            doc.insert(field, value);
        }
        Ok(doc.clone())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), DocumentStoreError> {
        self.simulate_network().await?;
        let mut collections = self.write()?;
        collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(key))
            .map(|_| ())
            .ok_or(DocumentStoreError::NotFound)
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, DocumentStoreError> {
        self.simulate_network().await?;
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Document)>, DocumentStoreError> {
        self.simulate_network().await?;
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| doc.get(field) == Some(value))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn is_empty(&self, collection: &str) -> Result<bool, DocumentStoreError> {
        self.simulate_network().await?;
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .is_none_or(|docs| docs.is_empty()))
    }
}
