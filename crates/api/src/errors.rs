//! Error-taxonomy → HTTP mapping.
//!
//! The use-case layer hands back taxonomy-tagged errors with a
//! field→messages map where applicable; the map is serialized verbatim in
//! the response body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use gatehouse_core::DomainError;

pub fn error_response(err: DomainError) -> axum::response::Response {
    let (status, message) = match &err {
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        DomainError::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),
        DomainError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized_request"),
        DomainError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
        DomainError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
        DomainError::Internal(detail) => {
            // Internal details are logged, never serialized to the caller.
            tracing::error!(error = %detail, "internal error answering request");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_server_error")
        }
    };

    let body = match err.fields() {
        Some(fields) => json!({ "message": message, "errors": fields }),
        None => json!({ "message": message }),
    };

    (status, Json(body)).into_response()
}

pub fn json_error(
    status: StatusCode,
    message: impl Into<String>,
) -> axum::response::Response {
    (status, Json(json!({ "message": message.into() }))).into_response()
}
