//! External surface: API-key-gated, read-only, trimmed response shapes.
//!
//! Handlers run with the synthetic external [`Caller`] inserted by the
//! API-key middleware.

use std::sync::Arc;

use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use uuid::Uuid;

use gatehouse_auth::Caller;
use gatehouse_core::{OrgId, UserId};
use gatehouse_identity::model::organization::{self, Organization};
use gatehouse_identity::model::user;

use crate::app::AppServices;
use crate::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/organizations", get(list_organizations))
        .route("/organizations/:id", get(get_organization))
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
}

fn organization_json(org: &Organization) -> serde_json::Value {
    json!({
        "id": org.id,
        "name": org.name,
        "code": org.code,
        "type": org.kind,
        "address": org.address,
        "is_active": org.is_active,
    })
}

pub async fn list_organizations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let params = match query.into_params(organization::SORTABLE_FIELDS) {
        Ok(params) => params,
        Err(e) => return errors::error_response(e),
    };

    match services.organizations.list(&caller, params).await {
        Ok(page) => {
            let items: Vec<_> = page.items.iter().map(organization_json).collect();
            (StatusCode::OK, Json(json!({ "data": items, "meta": page.meta }))).into_response()
        }
        Err(e) => errors::error_response(e),
    }
}

pub async fn get_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services.organizations.show(&caller, OrgId::from_uuid(id)).await {
        Ok(tree) => {
            (StatusCode::OK, Json(json!({ "data": organization_json(&tree.organization) })))
                .into_response()
        }
        Err(e) => errors::error_response(e),
    }
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let params = match query.into_params(user::SORTABLE_FIELDS) {
        Ok(params) => params,
        Err(e) => return errors::error_response(e),
    };

    match services.users.list(&caller, params).await {
        Ok(page) => {
            let items: Vec<_> = page
                .items
                .iter()
                .map(|summary| {
                    json!({
                        "id": summary.user.id,
                        "employee_id": summary.user.employee_id,
                        "username": summary.user.username,
                        "full_name": summary.user.full_name(),
                        "organization_id": summary.user.organization_id,
                        "is_active": summary.user.is_active,
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!({ "data": items, "meta": page.meta }))).into_response()
        }
        Err(e) => errors::error_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services.users.show(UserId::from_uuid(id)).await {
        Ok(detail) => (
            StatusCode::OK,
            Json(json!({
                "data": {
                    "id": detail.user.id,
                    "employee_id": detail.user.employee_id,
                    "username": detail.user.username,
                    "full_name": detail.user.full_name(),
                    "organization_id": detail.user.organization_id,
                    "is_active": detail.user.is_active,
                }
            })),
        )
            .into_response(),
        Err(e) => errors::error_response(e),
    }
}
