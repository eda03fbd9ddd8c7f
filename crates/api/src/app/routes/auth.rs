use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use storegate_infra::{AuthSession, LoginInput, RegisterInput, ResetPasswordInput};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

fn session_body(session: AuthSession) -> Json<serde_json::Value> {
    Json(json!({
        "token": session.token,
        "user": session.user,
    }))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let input = dto::body(payload)?;
    let session = services.workflow.register(input).await?.log_advisories();

    Ok((StatusCode::CREATED, session_body(session)).into_response())
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let input = dto::body(payload)?;
    let session = services.workflow.login(input).await?.log_advisories();

    Ok(session_body(session).into_response())
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    services.workflow.logout(principal.user_id()).await?;

    Ok(Json(json!({ "message": "logged out" })).into_response())
}

pub async fn reset_password(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<ResetPasswordInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let input = dto::body(payload)?;
    services.workflow.reset_password(input).await?;

    Ok(Json(json!({ "message": "password reset email sent" })).into_response())
}

pub async fn profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    let user = services.workflow.profile(principal.user_id()).await?;

    Ok(Json(json!({ "user": user })).into_response())
}

/// Echo the verified claims; no store round trip.
pub async fn verify(Extension(principal): Extension<PrincipalContext>) -> Response {
    let claims = principal.claims();
    Json(json!({
        "valid": true,
        "user": {
            "uid": claims.sub,
            "email": claims.email,
            "name": claims.name,
            "email_verified": claims.email_verified,
            "role": claims.role,
            "created_at": claims.created_at,
            "expires_at": claims.exp,
        },
    }))
    .into_response()
}

pub async fn health(Extension(principal): Extension<PrincipalContext>) -> Response {
    Json(json!({
        "status": "healthy",
        "uid": principal.user_id(),
        "role": principal.role(),
    }))
    .into_response()
}
