//! The gateway's authentication/authorization error taxonomy.
//!
//! Adapter errors (document store, identity provider) are translated into
//! this type at the workflow boundary; the HTTP layer maps each variant to a
//! status code and a user-facing message.

use thiserror::Error;

use crate::{AuthzError, TokenError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Malformed input, rejected before any external call.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("authorization token required")]
    Unauthenticated,

    #[error("invalid authorization header; expected: Bearer <token>")]
    MalformedCredential,

    #[error("token has expired")]
    TokenExpired,

    #[error("token is invalid")]
    TokenMalformed,

    #[error("{0}")]
    Forbidden(String),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("email is already registered")]
    EmailAlreadyRegistered,

    #[error("password is too weak (minimum 6 characters)")]
    WeakPassword,

    #[error("email address is invalid")]
    InvalidEmail,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is disabled")]
    AccountDisabled,

    #[error("too many attempts, try again later")]
    RateLimited,

    #[error("no account is registered for that email")]
    NoSuchUser,

    /// Transient failure (or timeout) of the document store or identity provider.
    #[error("upstream service unavailable: {0}")]
    AdapterUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn validation(errors: Vec<String>) -> Self {
        Self::Validation(errors)
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::AdapterUnavailable(msg.into())
    }

    /// Stable machine-readable code for response bodies and logs.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "validation_error",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::MalformedCredential => "malformed_credential",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenMalformed => "token_malformed",
            AuthError::Forbidden(_) => "forbidden",
            AuthError::NotFound => "not_found",
            AuthError::AlreadyExists => "already_exists",
            AuthError::EmailAlreadyRegistered => "email_already_registered",
            AuthError::WeakPassword => "weak_password",
            AuthError::InvalidEmail => "invalid_email",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::AccountDisabled => "account_disabled",
            AuthError::RateLimited => "rate_limited",
            AuthError::NoSuchUser => "no_such_user",
            AuthError::AdapterUnavailable(_) => "adapter_unavailable",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Whether the error is a credential problem (as opposed to a policy or
    /// infrastructure one).
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::Unauthenticated
                | AuthError::MalformedCredential
                | AuthError::TokenExpired
                | AuthError::TokenMalformed
                | AuthError::InvalidCredentials
        )
    }
}

impl From<TokenError> for AuthError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Malformed(_) => AuthError::TokenMalformed,
            TokenError::Signing(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<AuthzError> for AuthError {
    fn from(value: AuthzError) -> Self {
        AuthError::Forbidden(value.to_string())
    }
}
