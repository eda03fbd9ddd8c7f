//! Session token issuance and verification (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{validate_claims, Identity, Role, SessionClaims, TokenError};

pub const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Verifies a presented bearer token and yields its claims.
///
/// The access-control middleware depends on this seam rather than on the
/// concrete service, so tests can swap validators.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError>;
}

/// Issues and verifies signed session tokens.
///
/// The signing secret is injected once at construction. Rotating it (building
/// a new service with another secret) invalidates every outstanding token.
#[derive(Clone)]
pub struct SessionTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl core::fmt::Debug for SessionTokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionTokenService")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl SessionTokenService {
    pub fn new(secret: impl AsRef<[u8]>, lifetime: Duration) -> Self {
        let secret = secret.as_ref();

        // Expiry is checked by `validate_claims` against an explicit clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            lifetime,
        }
    }

    pub fn with_default_lifetime(secret: impl AsRef<[u8]>) -> Self {
        Self::new(secret, Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS))
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Build the claim set for `identity` as of `now`.
    pub fn claims_for(&self, identity: &Identity, role: Role, now: DateTime<Utc>) -> SessionClaims {
        SessionClaims {
            sub: identity.uid.clone(),
            email: identity.email.clone(),
            name: identity.name_or_email_prefix(),
            email_verified: identity.email_verified,
            role,
            created_at: identity.created_at,
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        }
    }

    pub fn issue(&self, identity: &Identity, role: Role) -> Result<String, TokenError> {
        self.issue_at(identity, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        identity: &Identity,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = self.claims_for(identity, role, now);
        self.sign(&claims)
    }

    /// Sign an already-built claim set.
    pub fn sign(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Check signature and encoding, then the claim time window at `now`.
    ///
    /// No I/O: the outcome depends only on the token, the secret and `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

impl JwtValidator for SessionTokenService {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        self.verify_at(token, now)
    }
}
