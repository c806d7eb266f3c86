//! `gatehouse-store` — Postgres persistence for the identity domain.
//!
//! Implements the `gatehouse-identity` repository contracts on sqlx:
//! connection pooling, embedded schema migrations, the transaction
//! coordinator with panic-safe rollback, and the list-query composition
//! shared by the paginated endpoints.

pub mod error;
pub mod pool;
pub mod query;
pub mod repository;
pub mod schema;
pub mod tx;

pub use error::StoreError;
pub use pool::{DbConfig, connect};
pub use repository::{
    PgOrganizationRepository, PgPermissionRepository, PgRoleRepository, PgUserRepository,
};
pub use schema::run_migrations;
pub use tx::TxManager;
