use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use storegate_auth::policy::{ensure_can_change_roles, ensure_can_delete, ensure_can_update, ensure_can_view};
use storegate_infra::{CreateAccountInput, ProfileChanges, PublicProfile};

use crate::app::dto::{self, ChangeRoleRequest, UpdateUserRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    let user = services.workflow.profile(principal.user_id()).await?;
    Ok(Json(json!({ "user": user })).into_response())
}

pub async fn list_users(Extension(services): Extension<Arc<AppServices>>) -> Result<Response, ApiError> {
    let users: Vec<PublicProfile> = services
        .users
        .list()
        .await?
        .iter()
        .map(PublicProfile::from)
        .collect();

    Ok(Json(json!({ "count": users.len(), "users": users })).into_response())
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let target = dto::parse_user_id(&id)?;
    ensure_can_view(&principal.principal(), &target)?;

    let profile = services.users.get_by_id(&target).await?;
    Ok(Json(json!({ "user": PublicProfile::from(&profile) })).into_response())
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<CreateAccountInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let input = dto::body(payload)?;
    let user = services
        .workflow
        .create_account(&principal.principal(), input)
        .await?
        .log_advisories();

    Ok((StatusCode::CREATED, Json(json!({ "user": user }))).into_response())
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let target = dto::parse_user_id(&id)?;
    let changes = dto::body(payload)?.into_changes()?;
    ensure_can_update(&principal.principal(), &target, changes.role.is_some())?;

    let profile = services.users.update(&target, changes).await?;
    tracing::info!(actor = %principal.user_id(), uid = %target, "profile updated");

    Ok(Json(json!({ "user": PublicProfile::from(&profile) })).into_response())
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let target = dto::parse_user_id(&id)?;
    ensure_can_delete(&principal.principal(), &target)?;

    services.users.delete(&target).await?;
    tracing::info!(actor = %principal.user_id(), uid = %target, "profile deleted");

    Ok(Json(json!({ "message": "user deleted", "uid": target })).into_response())
}

pub async fn change_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<ChangeRoleRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let target = dto::parse_user_id(&id)?;
    ensure_can_change_roles(&principal.principal())?;
    let role = dto::parse_role(dto::body(payload)?.role.as_deref())?;

    let profile = services.users.update(&target, ProfileChanges::role(role)).await?;
    tracing::info!(actor = %principal.user_id(), uid = %target, role = %role, "role changed");

    Ok(Json(json!({ "user": PublicProfile::from(&profile) })).into_response())
}
