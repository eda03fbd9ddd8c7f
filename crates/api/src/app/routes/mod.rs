use axum::{
    routing::{get, patch, post},
    Router,
};

use storegate_auth::Role;

use crate::middleware::{auth_middleware, with_roles, AuthState};

pub mod auth;
pub mod products;
pub mod system;
pub mod users;

const ADMIN: &[Role] = &[Role::Admin];

/// `/auth`: credential endpoints are public, the rest need a token.
pub fn auth_router(auth: &AuthState) -> Router {
    let protected = Router::new()
        .route("/logout", post(auth::logout))
        .route("/profile", get(auth::profile))
        .route("/verify", get(auth::verify))
        .route("/health", get(auth::health))
        .route_layer(axum::middleware::from_fn_with_state(auth.clone(), auth_middleware));

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/reset-password", post(auth::reset_password))
        .merge(protected)
}

/// `/users`: every route needs a token; ownership is checked in handlers.
pub fn users_router(auth: &AuthState) -> Router {
    Router::new()
        .route("/me", get(users::me))
        .route(
            "/",
            with_roles(get(users::list_users).post(users::create_user), ADMIN),
        )
        .route(
            "/:id",
            get(users::get_user)
                .put(users::update_user)
                .merge(with_roles(axum::routing::delete(users::delete_user), ADMIN)),
        )
        .route("/:id/role", with_roles(patch(users::change_role), ADMIN))
        .route_layer(axum::middleware::from_fn_with_state(auth.clone(), auth_middleware))
}

/// `/api/products`: reads are public, writes are admin-only.
pub fn products_router(auth: &AuthState) -> Router {
    Router::new()
        .route("/", get(products::list_products))
        .route(
            "/create",
            auth.protect(with_roles(post(products::create_product), ADMIN)),
        )
        .route(
            "/:id",
            get(products::get_product).merge(auth.protect(with_roles(
                axum::routing::put(products::update_product).delete(products::delete_product),
                ADMIN,
            ))),
        )
}
