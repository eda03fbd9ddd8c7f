use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use storegate_auth::{AuthError, AuthzError};
use storegate_infra::DocumentStoreError;

/// Error type returned by handlers and middleware.
///
/// Wraps the gateway taxonomy so `?` works on workflow, repository and
/// policy results alike.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub AuthError);

impl From<DocumentStoreError> for ApiError {
    fn from(err: DocumentStoreError) -> Self {
        Self(err.into())
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        auth_error_to_response(self.0)
    }
}

pub fn status_for(err: &AuthError) -> StatusCode {
    match err {
        AuthError::Validation(_) | AuthError::WeakPassword | AuthError::InvalidEmail => {
            StatusCode::BAD_REQUEST
        }
        AuthError::Unauthenticated
        | AuthError::MalformedCredential
        | AuthError::TokenExpired
        | AuthError::TokenMalformed
        | AuthError::InvalidCredentials
        | AuthError::AccountDisabled => StatusCode::UNAUTHORIZED,
        AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
        AuthError::NotFound | AuthError::NoSuchUser => StatusCode::NOT_FOUND,
        AuthError::AlreadyExists | AuthError::EmailAlreadyRegistered => StatusCode::CONFLICT,
        AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        AuthError::AdapterUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map the taxonomy to `{error, message}`. Adapter and internal detail is
/// logged here and replaced by a fixed message.
pub fn auth_error_to_response(err: AuthError) -> Response {
    let status = status_for(&err);
    let code = err.code();

    match err {
        AuthError::Validation(details) => (
            status,
            axum::Json(json!({
                "error": code,
                "message": "validation failed",
                "details": details,
            })),
        )
            .into_response(),
        AuthError::AdapterUnavailable(detail) => {
            tracing::warn!(error.code = code, detail = %detail, "upstream adapter unavailable");
            json_error(status, code, "service temporarily unavailable, try again later")
        }
        AuthError::Internal(detail) => {
            tracing::error!(error.code = code, detail = %detail, "internal error");
            json_error(status, code, "internal server error")
        }
        other => json_error(status, code, other.to_string()),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
