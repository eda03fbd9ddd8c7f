use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storegate_core::UserId;

use crate::Role;

/// Session token claim set.
///
/// Everything a handler needs to know about the caller for the lifetime of
/// the token. `iat`/`exp` are unix seconds as in any JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: identity-provider account identifier.
    pub sub: UserId,

    pub email: String,

    /// Display name (or the email's local part when the account has none).
    pub name: String,

    pub email_verified: bool,

    /// Role resolved from the user profile at issue time.
    pub role: Role,

    /// Account creation time as reported by the identity provider.
    pub created_at: DateTime<Utc>,

    /// Issued-at (unix seconds).
    pub iat: i64,

    /// Expiration (unix seconds).
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("token could not be signed: {0}")]
    Signing(String),
}

/// Deterministically validate the time window of decoded claims.
///
/// Signature verification happens before this, in [`crate::SessionTokenService`].
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.exp <= claims.iat {
        return Err(TokenError::Malformed(
            "invalid time window (exp <= iat)".to_string(),
        ));
    }
    if now.timestamp() >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(iat: DateTime<Utc>, exp: DateTime<Utc>) -> SessionClaims {
        SessionClaims {
            sub: UserId::parse("u-1").unwrap(),
            email: "a@b.co".to_string(),
            name: "a".to_string(),
            email_verified: false,
            role: Role::User,
            created_at: iat,
            iat: iat.timestamp(),
            exp: exp.timestamp(),
        }
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let c = claims(now - Duration::hours(1), now);
        assert_eq!(validate_claims(&c, now), Err(TokenError::Expired));
        assert_eq!(validate_claims(&c, now - Duration::seconds(1)), Ok(()));
    }

    #[test]
    fn inverted_window_is_malformed() {
        let now = Utc::now();
        let c = claims(now, now - Duration::minutes(5));
        assert!(matches!(
            validate_claims(&c, now - Duration::hours(1)),
            Err(TokenError::Malformed(_))
        ));
    }
}
