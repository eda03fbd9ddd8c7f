use axum::{
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::app::errors;

pub async fn root() -> Response {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": ["POST /auth/register", "POST /auth/login", "POST /auth/logout",
                     "POST /auth/reset-password", "GET /auth/profile", "GET /auth/verify"],
            "users": ["GET /users/me", "GET /users", "GET /users/:id", "POST /users",
                      "PUT /users/:id", "DELETE /users/:id", "PATCH /users/:id/role"],
            "products": ["GET /api/products", "GET /api/products/:id", "POST /api/products/create",
                         "PUT /api/products/:id", "DELETE /api/products/:id"],
        },
        "timestamp": Utc::now(),
    }))
    .into_response()
}

pub async fn health() -> Response {
    (
        StatusCode::OK,
        Json(json!({ "status": "healthy", "timestamp": Utc::now() })),
    )
        .into_response()
}

pub async fn not_found(method: Method, uri: Uri) -> Response {
    tracing::debug!(%method, path = %uri.path(), "no route");
    errors::json_error(
        StatusCode::NOT_FOUND,
        "not_found",
        format!("route {method} {} does not exist", uri.path()),
    )
}
