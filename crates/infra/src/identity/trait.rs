use async_trait::async_trait;
use thiserror::Error;

use storegate_auth::Identity;
use storegate_core::UserId;

/// Failures reported by the identity provider.
///
/// These are provider vocabulary. The auth workflow translates them into
/// [`storegate_auth::AuthError`]; they never reach HTTP callers directly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("email already in use")]
    EmailAlreadyInUse,

    #[error("invalid email")]
    InvalidEmail,

    #[error("weak password")]
    WeakPassword,

    #[error("user not found")]
    UserNotFound,

    #[error("wrong password")]
    WrongPassword,

    #[error("invalid credential")]
    InvalidCredential,

    #[error("user disabled")]
    UserDisabled,

    #[error("too many requests")]
    TooManyRequests,

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("identity provider error: {0}")]
    Other(String),
}

impl IdentityError {
    /// Provider-style error code, for logs only.
    pub fn code(&self) -> &'static str {
        match self {
            IdentityError::EmailAlreadyInUse => "auth/email-already-in-use",
            IdentityError::InvalidEmail => "auth/invalid-email",
            IdentityError::WeakPassword => "auth/weak-password",
            IdentityError::UserNotFound => "auth/user-not-found",
            IdentityError::WrongPassword => "auth/wrong-password",
            IdentityError::InvalidCredential => "auth/invalid-credential",
            IdentityError::UserDisabled => "auth/user-disabled",
            IdentityError::TooManyRequests => "auth/too-many-requests",
            IdentityError::Unavailable(_) => "auth/network-request-failed",
            IdentityError::Other(_) => "auth/internal-error",
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a credential account and return its identity.
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    /// Verify credentials; refreshes the identity's last sign-in time.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    async fn sign_out(&self, uid: &UserId) -> Result<(), IdentityError>;

    /// Dispatch a password-reset email.
    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError>;

    async fn update_display_name(&self, uid: &UserId, name: &str) -> Result<Identity, IdentityError>;
}
