//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: adapters, repositories, workflow
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: error taxonomy to HTTP mapping

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use storegate_infra::GatewayConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router over in-memory adapters (used by `main.rs`).
pub fn build_app(config: &GatewayConfig) -> Router {
    tracing::warn!("using in-memory document store and identity provider; state is not persisted");
    build_app_with(Arc::new(services::AppServices::in_memory(config)))
}

/// Build the router over already wired services.
pub fn build_app_with(services: Arc<services::AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        jwt: services.tokens.clone(),
        users: services.users.clone(),
    };

    Router::new()
        .route("/", get(routes::system::root))
        .route("/health", get(routes::system::health))
        .nest("/auth", routes::auth_router(&auth_state))
        .nest("/users", routes::users_router(&auth_state))
        .nest("/api/products", routes::products_router(&auth_state))
        .fallback(routes::system::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(Extension(services))
                .layer(axum::middleware::from_fn(middleware::log_requests)),
        )
}
