use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// GET /check/health
pub async fn health() -> axum::response::Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") })),
    )
        .into_response()
}
