//! Organization endpoints (session surface).

use std::sync::Arc;

use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use gatehouse_auth::Caller;
use gatehouse_core::OrgId;
use gatehouse_identity::model::organization;

use crate::app::AppServices;
use crate::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create).get(index))
        .route("/:id", get(show).patch(update).delete(remove))
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<dto::CreateOrganizationRequest>,
) -> axum::response::Response {
    let cmd = match body.validate() {
        Ok(cmd) => cmd,
        Err(e) => return errors::error_response(e),
    };

    match services.organizations.create(&caller, cmd).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "data": { "id": id } })),
        )
            .into_response(),
        Err(e) => errors::error_response(e),
    }
}

/// Returns the node plus its full descendant subtree.
pub async fn show(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services.organizations.show(&caller, OrgId::from_uuid(id)).await {
        Ok(tree) => (StatusCode::OK, Json(serde_json::json!({ "data": tree }))).into_response(),
        Err(e) => errors::error_response(e),
    }
}

pub async fn index(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let params = match query.into_params(organization::SORTABLE_FIELDS) {
        Ok(params) => params,
        Err(e) => return errors::error_response(e),
    };

    match services.organizations.list(&caller, params).await {
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
    Json(body): Json<dto::UpdateOrganizationRequest>,
) -> axum::response::Response {
    let patch = match body.validate(OrgId::from_uuid(id)) {
        Ok(patch) => patch,
        Err(e) => return errors::error_response(e),
    };

    match services.organizations.update(&caller, patch).await {
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
    match services.organizations.delete(&caller, OrgId::from_uuid(id)).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "data": { "id": id } })))
            .into_response(),
        Err(e) => errors::error_response(e),
    }
}
