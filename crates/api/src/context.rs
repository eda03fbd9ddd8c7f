use storegate_auth::{Principal, Role, SessionClaims};
use storegate_core::UserId;

/// Authenticated caller for a request.
///
/// Inserted into request extensions by the auth middleware and extracted by
/// handlers with `Extension<PrincipalContext>`. Carries the verified token
/// claims unchanged; the role is the one embedded at issue time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    claims: SessionClaims,
}

impl PrincipalContext {
    pub fn new(claims: SessionClaims) -> Self {
        Self { claims }
    }

    pub fn user_id(&self) -> &UserId {
        &self.claims.sub
    }

    pub fn role(&self) -> Role {
        self.claims.role
    }

    pub fn email(&self) -> &str {
        &self.claims.email
    }

    pub fn claims(&self) -> &SessionClaims {
        &self.claims
    }

    pub fn principal(&self) -> Principal {
        Principal::from(&self.claims)
    }
}
