//! `storegate-auth`: pure authentication/authorization boundary.
//!
//! Token issuance and verification, roles, access policy and input
//! validation. No HTTP, no storage.

pub mod authorize;
pub mod claims;
pub mod error;
pub mod identity;
pub mod outcome;
pub mod policy;
pub mod roles;
pub mod token;
pub mod validation;

pub use authorize::{authorize_roles, AuthzError, Principal};
pub use claims::{validate_claims, SessionClaims, TokenError};
pub use error::AuthError;
pub use identity::Identity;
pub use outcome::{Advisory, Outcome};
pub use roles::{Role, UnknownRole};
pub use token::{JwtValidator, SessionTokenService, DEFAULT_TOKEN_LIFETIME_HOURS};
