use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use storegate_auth::AuthError;
use storegate_core::ProductId;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

fn parse_product_id(raw: &str) -> Result<ProductId, ApiError> {
    raw.parse::<ProductId>()
        .map_err(|e| AuthError::validation(vec![e.to_string()]).into())
}

pub async fn list_products(Extension(services): Extension<Arc<AppServices>>) -> Result<Response, ApiError> {
    let products = services.catalog.list().await?;
    Ok(Json(json!({ "count": products.len(), "products": products })).into_response())
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let product = services.catalog.get(parse_product_id(&id)?).await?;
    Ok(Json(json!({ "product": product })).into_response())
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let fields = dto::object_body(payload)?;
    let product = services.catalog.create(fields).await?;
    tracing::info!(actor = %principal.user_id(), id = %product["id"], "product created");

    Ok((StatusCode::CREATED, Json(json!({ "product": product }))).into_response())
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = parse_product_id(&id)?;
    let fields = dto::object_body(payload)?;
    let product = services.catalog.update(id, fields).await?;
    tracing::info!(actor = %principal.user_id(), id = %id, "product updated");

    Ok(Json(json!({ "product": product })).into_response())
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_product_id(&id)?;
    services.catalog.delete(id).await?;
    tracing::info!(actor = %principal.user_id(), id = %id, "product deleted");

    Ok(Json(json!({ "message": "product deleted", "id": id.to_string() })).into_response())
}
