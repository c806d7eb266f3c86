//! Permission endpoints.

use std::sync::Arc;

use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use uuid::Uuid;

use gatehouse_auth::Caller;
use gatehouse_core::PermissionId;
use gatehouse_identity::model::permission;

use crate::app::AppServices;
use crate::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create).get(index))
        .route("/:id", axum::routing::patch(update).delete(remove))
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<dto::CreatePermissionRequest>,
) -> axum::response::Response {
    let cmd = match body.validate() {
        Ok(cmd) => cmd,
        Err(e) => return errors::error_response(e),
    };

    match services.permissions.create(&caller, cmd).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "data": { "id": id } })),
        )
            .into_response(),
        Err(e) => errors::error_response(e),
    }
}

pub async fn index(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let params = match query.into_params(permission::SORTABLE_FIELDS) {
        Ok(params) => params,
        Err(e) => return errors::error_response(e),
    };

    match services.permissions.list(params).await {
        Ok(page) => (
            StatusCode::OK,
            Json(serde_json::json!({ "data": page.items, "meta": page.meta })),
        )
            .into_response(),
        Err(e) => errors::error_response(e),
    }
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(body): Json<dto::UpdatePermissionRequest>,
) -> axum::response::Response {
    let patch = match body.validate(PermissionId::from_uuid(id)) {
        Ok(patch) => patch,
        Err(e) => return errors::error_response(e),
    };

    match services.permissions.update(&caller, patch).await {
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
    match services.permissions.delete(&caller, PermissionId::from_uuid(id)).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "data": { "id": id } })))
            .into_response(),
        Err(e) => errors::error_response(e),
    }
}
