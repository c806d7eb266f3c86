//! Role endpoints and the role-permission association.

use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use uuid::Uuid;

use gatehouse_auth::Caller;
use gatehouse_core::{RoleId, RolePermissionId};

use crate::app::AppServices;
use crate::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(index).post(create))
        .route("/:id", axum::routing::patch(update).delete(remove))
}

pub fn role_permissions_router() -> Router {
    Router::new()
        .route("/", post(create_role_permission))
        .route("/:id", delete(delete_role_permission))
}

pub async fn index(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.roles.list().await {
        Ok(roles) => (StatusCode::OK, Json(serde_json::json!({ "data": roles }))).into_response(),
        Err(e) => errors::error_response(e),
    }
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<dto::CreateRoleRequest>,
) -> axum::response::Response {
    let cmd = match body.validate() {
        Ok(cmd) => cmd,
        Err(e) => return errors::error_response(e),
    };

    match services.roles.create(&caller, cmd).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "data": { "id": id } })),
        )
            .into_response(),
        Err(e) => errors::error_response(e),
    }
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(body): Json<dto::UpdateRoleRequest>,
) -> axum::response::Response {
    let (patch, permission_ids) = match body.validate(RoleId::from_uuid(id)) {
        Ok(pair) => pair,
        Err(e) => return errors::error_response(e),
    };

    match services.roles.update(&caller, patch, permission_ids).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "data": { "id": id } })))
            .into_response(),
        Err(e) => errors::error_response(e),
    }
}

pub async fn remove(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services.roles.delete(&caller, RoleId::from_uuid(id)).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "data": { "id": id } })))
            .into_response(),
        Err(e) => errors::error_response(e),
    }
}

pub async fn create_role_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<dto::CreateRolePermissionRequest>,
) -> axum::response::Response {
    let cmd = match body.validate() {
        Ok(cmd) => cmd,
        Err(e) => return errors::error_response(e),
    };

    match services.roles.create_role_permission(&caller, cmd).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "data": { "id": id } })),
        )
            .into_response(),
        Err(e) => errors::error_response(e),
    }
}

pub async fn delete_role_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services
        .roles
        .delete_role_permission(&caller, RolePermissionId::from_uuid(id))
        .await
    {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "data": { "id": id } })))
            .into_response(),
        Err(e) => errors::error_response(e),
    }
}
