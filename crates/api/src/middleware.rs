use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::MethodRouter,
};
use chrono::Utc;

use storegate_auth::{authorize_roles, Advisory, AuthError, JwtValidator, Outcome, Role, SessionClaims};
use storegate_infra::UserRepository;

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    pub users: UserRepository,
}

impl AuthState {
    /// Put `route` behind token authentication.
    pub fn protect(&self, route: MethodRouter) -> MethodRouter {
        route.route_layer(from_fn_with_state(self.clone(), auth_middleware))
    }
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;

    let claims = state.jwt.validate(token, Utc::now()).map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        AuthError::from(e)
    })?;

    // Claims are trusted for the token's lifetime even if the profile is gone.
    cross_check_profile(&state.users, &claims).await.log_advisories();

    req.extensions_mut().insert(PrincipalContext::new(claims));
    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::Unauthenticated)?;

    let header = header.to_str().map_err(|_| AuthError::MalformedCredential)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedCredential)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MalformedCredential);
    }

    Ok(token)
}

async fn cross_check_profile(users: &UserRepository, claims: &SessionClaims) -> Outcome<()> {
    let uid = &claims.sub;
    match users.find(uid).await {
        Ok(Some(_)) => Outcome::clean(()),
        Ok(None) => Outcome::with_advisories((), vec![Advisory::ProfileMissing { uid: uid.clone() }]),
        Err(e) => Outcome::with_advisories(
            (),
            vec![Advisory::ProfileCheckFailed {
                uid: uid.clone(),
                reason: e.to_string(),
            }],
        ),
    }
}

/// Role allow-list for a route. Empty means any authenticated caller.
#[derive(Debug, Clone, Default)]
pub struct RoleGuard {
    roles: Arc<[Role]>,
}

impl RoleGuard {
    pub fn new(roles: &[Role]) -> Self {
        Self {
            roles: Arc::from(roles),
        }
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

/// Runs after [`auth_middleware`]; a missing principal is reported as role `none`.
pub async fn require_roles(
    State(guard): State<RoleGuard>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let role = req.extensions().get::<PrincipalContext>().map(PrincipalContext::role);

    if let Err(e) = authorize_roles(role.as_ref(), guard.roles()) {
        tracing::info!(role = ?role, required = ?guard.roles(), "role check failed");
        return Err(e.into());
    }

    Ok(next.run(req).await)
}

/// Guard `route` with a role allow-list. Authentication must be layered outside.
pub fn with_roles(route: MethodRouter, roles: &[Role]) -> MethodRouter {
    route.route_layer(from_fn_with_state(RoleGuard::new(roles), require_roles))
}

pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}
