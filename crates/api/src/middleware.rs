//! Request middleware: session auth, API-key auth, panic recovery.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use futures::FutureExt;

use gatehouse_auth::{Caller, ClaimRole, TokenCodec};
use gatehouse_identity::UserRepository;

use crate::errors;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenCodec>,
    pub users: Arc<dyn UserRepository>,
}

/// Bearer-JWT authentication for the session surface.
///
/// The token only proves who the caller was at issuance; the user and its
/// roles are re-read so a deleted user or revoked role takes effect
/// immediately, and the resolved [`Caller`] is inserted as an extension.
pub async fn session_auth(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(req.headers()) {
        Some(token) => token,
        None => return errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized_request"),
    };

    let claims = match state.tokens.verify(&token) {
        Ok(claims) => claims,
        Err(_) => return errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized_request"),
    };

    let user = match state.users.find_by_id(claims.sub).await {
        Ok(Some(user)) => user,
        _ => return errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized_request"),
    };
    let roles = match state.users.roles_for_user(user.id).await {
        Ok(roles) => roles,
        Err(_) => return errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized_request"),
    };

    let caller = Caller::session(
        user.id,
        user.username,
        roles.into_iter().map(|r| ClaimRole { id: r.id, name: r.name }).collect(),
        user.organization_id,
    );
    req.extensions_mut().insert(caller);

    next.run(req).await
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[derive(Clone)]
pub struct ApiKeyState {
    pub api_key: String,
}

/// Static-key authentication for the external surface. Callers get a
/// synthetic external identity.
pub async fn api_key_auth(
    State(state): State<ApiKeyState>,
    mut req: Request,
    next: Next,
) -> Response {
    let presented = req.headers().get("x-api-key").and_then(|v| v.to_str().ok());
    if presented != Some(state.api_key.as_str()) {
        return errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized_request");
    }

    req.extensions_mut().insert(Caller::external());
    next.run(req).await
}

/// Panic recovery boundary: a handler panic is logged with its request
/// context and answered with a generic 500, keeping the process alive.
pub async fn recovery(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let message = panic_message(panic);
            tracing::error!(
                %method,
                %path,
                panic = %message,
                "panic recovered in request handler"
            );
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_server_error")
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
