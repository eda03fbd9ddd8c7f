//! Document store adapter: key/value documents grouped in collections.
//!
//! The managed document database sits behind [`DocumentStore`]; the gateway
//! ships an in-memory implementation for tests/dev.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryDocumentStore;
pub use r#trait::{Document, DocumentStore, DocumentStoreError};
