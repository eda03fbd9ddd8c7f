//! Infrastructure layer: store and identity adapters, repositories, the
//! authentication workflow and configuration.

pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod deadline;
pub mod document_store;
pub mod identity;
pub mod users;
pub mod workflow;

#[cfg(test)]
mod integration_tests;

pub use bootstrap::AdminBootstrap;
pub use catalog::ProductCatalog;
pub use config::{ConfigError, Environment, GatewayConfig};
pub use deadline::{BoundedIdentityProvider, BoundedStore};
pub use document_store::{Document, DocumentStore, DocumentStoreError, InMemoryDocumentStore};
pub use identity::{IdentityError, IdentityProvider, InMemoryIdentityProvider};
pub use users::{NewProfile, ProfileChanges, PublicProfile, UserProfile, UserRepository};
pub use workflow::{
    AuthSession, AuthWorkflow, CreateAccountInput, LoginInput, RegisterInput, ResetPasswordInput,
};
