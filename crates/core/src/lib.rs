//! `storegate-core`: shared building blocks (identifiers, domain errors).
//!
//! This crate has no infrastructure concerns.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{ProductId, UserId};
