//! Public surface: unauthenticated, read-only organization views.
//!
//! Handlers run under the synthetic anonymous [`Caller`].

use std::sync::Arc;

use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use uuid::Uuid;

use gatehouse_auth::Caller;
use gatehouse_core::OrgId;
use gatehouse_identity::model::organization::{self, Organization};

use crate::app::AppServices;
use crate::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/organizations", get(list_organizations))
        .route("/organizations/:id", get(get_organization))
}

fn organization_json(org: &Organization) -> serde_json::Value {
    json!({
        "id": org.id,
        "name": org.name,
        "code": org.code,
        "type": org.kind,
    })
}

pub async fn list_organizations(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let params = match query.into_params(organization::SORTABLE_FIELDS) {
        Ok(params) => params,
        Err(e) => return errors::error_response(e),
    };

    match services.organizations.list(&Caller::anonymous(), params).await {
        Ok(page) => {
            let items: Vec<_> = page.items.iter().map(organization_json).collect();
            (StatusCode::OK, Json(json!({ "data": items, "meta": page.meta }))).into_response()
        }
        Err(e) => errors::error_response(e),
    }
}

pub async fn get_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services
        .organizations
        .show(&Caller::anonymous(), OrgId::from_uuid(id))
        .await
    {
        Ok(tree) => {
            (StatusCode::OK, Json(json!({ "data": organization_json(&tree.organization) })))
                .into_response()
        }
        Err(e) => errors::error_response(e),
    }
}
