//! Identity provider adapter: credential accounts owned by an external service.
//!
//! Passwords are handed straight to the provider and never stored by the
//! gateway. [`InMemoryIdentityProvider`] stands in for the managed service in
//! tests/dev.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryIdentityProvider;
pub use r#trait::{IdentityError, IdentityProvider};
