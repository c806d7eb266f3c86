//! Router + service wiring.

use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Router};
use sqlx::PgPool;

use gatehouse_auth::TokenCodec;
use gatehouse_identity::{
    AccessResolver, OrganizationRepository, OrganizationService, PermissionRepository,
    PermissionService, RoleRepository, RoleService, UserRepository, UserService,
};
use gatehouse_store::{
    PgOrganizationRepository, PgPermissionRepository, PgRoleRepository, PgUserRepository,
};

use crate::config::Config;
use crate::{middleware, routes};

/// The use-case services shared by all handlers.
pub struct AppServices {
    pub organizations: OrganizationService,
    pub users: UserService,
    pub roles: RoleService,
    pub permissions: PermissionService,
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Three surfaces: `/api/v1` behind JWT sessions, `/api/external/v1`
/// behind the static API key, `/api/public/v1` with no credential. The
/// panic-recovery boundary wraps everything.
pub fn build_app(config: &Config, pool: PgPool) -> Router {
    let tokens = Arc::new(TokenCodec::new(config.jwt.secret_key.as_bytes()));

    let organizations: Arc<dyn OrganizationRepository> =
        Arc::new(PgOrganizationRepository::new(pool.clone()));
    let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));
    let roles: Arc<dyn RoleRepository> = Arc::new(PgRoleRepository::new(pool.clone()));
    let permissions: Arc<dyn PermissionRepository> =
        Arc::new(PgPermissionRepository::new(pool));

    let resolver = AccessResolver::new(users.clone(), permissions.clone());
    let services = Arc::new(AppServices {
        organizations: OrganizationService::new(organizations.clone()),
        users: UserService::new(
            users.clone(),
            organizations,
            roles.clone(),
            resolver,
            tokens.clone(),
        ),
        roles: RoleService::new(roles, permissions.clone()),
        permissions: PermissionService::new(permissions),
    });

    let auth_state = middleware::AuthState { tokens, users };
    let api_key_state = middleware::ApiKeyState { api_key: config.app.api_key.clone() };

    let session = Router::new()
        .nest("/organizations", routes::organizations::router())
        .nest("/users", routes::users::router())
        .nest("/roles", routes::roles::router())
        .nest("/user-roles", routes::users::user_roles_router())
        .nest("/role-permissions", routes::roles::role_permissions_router())
        .nest("/permissions", routes::permissions::router())
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::session_auth,
        ));

    let external = routes::external::router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            api_key_state,
            middleware::api_key_auth,
        ));

    let public = routes::public::router()
        .merge(routes::users::public_router())
        .layer(Extension(services));

    Router::new()
        .route("/check/health", get(routes::system::health))
        .nest("/api/v1", session)
        .nest("/api/external/v1", external)
        .nest("/api/public/v1", public)
        .layer(axum::middleware::from_fn(middleware::recovery))
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::util::ServiceExt;

    use crate::{middleware, routes};

    #[tokio::test]
    async fn health_answers_ok() {
        let app = Router::new().route("/check/health", get(routes::system::health));

        let response = app
            .oneshot(Request::builder().uri("/check/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn handler_panic_is_answered_with_500() {
        async fn boom() -> &'static str {
            panic!("handler blew up");
        }

        let app = Router::new()
            .route("/boom", get(boom))
            .layer(axum::middleware::from_fn(middleware::recovery));

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
