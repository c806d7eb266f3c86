//! User endpoints: session surface, the public login/register pair, and
//! the user-role association.

use std::sync::Arc;

use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use uuid::Uuid;

use gatehouse_auth::Caller;
use gatehouse_core::{UserId, UserRoleId};
use gatehouse_identity::model::user;

use crate::app::AppServices;
use crate::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/whoami", get(whoami))
        .route("/:id", get(show).patch(update).delete(remove))
        .route("/:id/change-password", patch(change_password))
}

/// Login and register live on the public surface.
pub fn public_router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
}

pub fn user_roles_router() -> Router {
    Router::new()
        .route("/", post(create_user_role))
        .route("/:id", delete(delete_user_role))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequestBody>,
) -> axum::response::Response {
    let cmd = match body.validate() {
        Ok(cmd) => cmd,
        Err(e) => return errors::error_response(e),
    };

    match services.users.login(cmd).await {
        Ok(token) => {
            (StatusCode::OK, Json(serde_json::json!({ "data": { "token": token } })))
                .into_response()
        }
        Err(e) => errors::error_response(e),
    }
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterUserRequest>,
) -> axum::response::Response {
    let cmd = match body.validate() {
        Ok(cmd) => cmd,
        Err(e) => return errors::error_response(e),
    };

    match services.users.create(&Caller::anonymous(), cmd).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "data": { "id": id } })),
        )
            .into_response(),
        Err(e) => errors::error_response(e),
    }
}

/// Echo the resolved caller identity.
pub async fn whoami(Extension(caller): Extension<Caller>) -> axum::response::Response {
    (StatusCode::OK, Json(serde_json::json!({ "data": caller }))).into_response()
}

pub async fn show(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services.users.show(UserId::from_uuid(id)).await {
        Ok(detail) => (StatusCode::OK, Json(serde_json::json!({ "data": detail }))).into_response(),
        Err(e) => errors::error_response(e),
    }
}

pub async fn index(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let params = match query.into_params(user::SORTABLE_FIELDS) {
        Ok(params) => params,
        Err(e) => return errors::error_response(e),
    };

    match services.users.list(&caller, params).await {
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
    Json(body): Json<dto::UpdateUserRequest>,
) -> axum::response::Response {
    let cmd = match body.validate() {
        Ok(cmd) => cmd,
        Err(e) => return errors::error_response(e),
    };

    match services.users.update(&caller, UserId::from_uuid(id), cmd).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "data": { "id": id } })))
            .into_response(),
        Err(e) => errors::error_response(e),
    }
}

pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(body): Json<dto::ChangePasswordRequest>,
) -> axum::response::Response {
    let (old_password, new_password) = match body.validate() {
        Ok(pair) => pair,
        Err(e) => return errors::error_response(e),
    };

    match services
        .users
        .change_password(&caller, UserId::from_uuid(id), &old_password, &new_password)
        .await
    {
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
    match services.users.delete(&caller, UserId::from_uuid(id)).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "data": { "id": id } })))
            .into_response(),
        Err(e) => errors::error_response(e),
    }
}

pub async fn create_user_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<dto::CreateUserRoleRequest>,
) -> axum::response::Response {
    let cmd = match body.validate() {
        Ok(cmd) => cmd,
        Err(e) => return errors::error_response(e),
    };

    match services.users.create_user_role(&caller, cmd).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "data": { "id": id } })),
        )
            .into_response(),
        Err(e) => errors::error_response(e),
    }
}

pub async fn delete_user_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services
        .users
        .delete_user_role(&caller, UserRoleId::from_uuid(id))
        .await
    {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "data": { "id": id } })))
            .into_response(),
        Err(e) => errors::error_response(e),
    }
}
