//! Embedded schema migrations.
//!
//! Idempotent DDL executed at startup. Soft deletes use a nullable
//! `deleted_at`/`deleted_by` pair; natural-key uniqueness (usernames,
//! role names, permission tuples) is enforced by case-folded checks in the
//! use-case layer, so only lookup indexes are created here. The
//! organizations path index uses `text_pattern_ops` so the subtree
//! prefix LIKE can use it.

use sqlx::PgPool;
use tracing::info;

use crate::error::StoreError;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS organizations (
        id          UUID PRIMARY KEY,
        name        TEXT NOT NULL,
        code        TEXT NOT NULL,
        address     TEXT,
        latitude    TEXT,
        longitude   TEXT,
        type        TEXT,
        parent_id   UUID REFERENCES organizations (id),
        path        TEXT,
        level       INTEGER NOT NULL DEFAULT 0,
        is_active   BOOLEAN NOT NULL DEFAULT TRUE,
        created_at  TIMESTAMPTZ NOT NULL,
        created_by  TEXT NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL,
        updated_by  TEXT NOT NULL,
        deleted_at  TIMESTAMPTZ,
        deleted_by  TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_organizations_path ON organizations (path text_pattern_ops)",
    "CREATE INDEX IF NOT EXISTS idx_organizations_parent ON organizations (parent_id)",
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id                    UUID PRIMARY KEY,
        employee_id           TEXT NOT NULL,
        username              TEXT NOT NULL,
        email                 TEXT,
        first_name            TEXT NOT NULL,
        last_name             TEXT,
        phone_number          TEXT NOT NULL,
        password_hash         TEXT NOT NULL,
        organization_id       UUID NOT NULL REFERENCES organizations (id),
        is_active             BOOLEAN NOT NULL DEFAULT TRUE,
        last_login_at         TIMESTAMPTZ,
        avatar_gradient_start TEXT,
        avatar_gradient_end   TEXT,
        created_at            TIMESTAMPTZ NOT NULL,
        created_by            TEXT NOT NULL,
        updated_at            TIMESTAMPTZ NOT NULL,
        updated_by            TEXT NOT NULL,
        deleted_at            TIMESTAMPTZ,
        deleted_by            TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_users_username ON users (username)",
    "CREATE INDEX IF NOT EXISTS idx_users_employee_id ON users (employee_id)",
    "CREATE INDEX IF NOT EXISTS idx_users_phone_number ON users (phone_number)",
    "CREATE INDEX IF NOT EXISTS idx_users_organization ON users (organization_id)",
    r#"
    CREATE TABLE IF NOT EXISTS roles (
        id          UUID PRIMARY KEY,
        name        TEXT NOT NULL,
        description TEXT,
        is_system   BOOLEAN NOT NULL DEFAULT FALSE,
        created_at  TIMESTAMPTZ NOT NULL,
        created_by  TEXT NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL,
        updated_by  TEXT NOT NULL,
        deleted_at  TIMESTAMPTZ,
        deleted_by  TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS permissions (
        id          UUID PRIMARY KEY,
        name        TEXT NOT NULL,
        action      TEXT,
        resource    TEXT,
        description TEXT,
        created_at  TIMESTAMPTZ NOT NULL,
        created_by  TEXT NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL,
        updated_by  TEXT NOT NULL,
        deleted_at  TIMESTAMPTZ,
        deleted_by  TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_roles (
        id         UUID PRIMARY KEY,
        user_id    UUID NOT NULL REFERENCES users (id),
        role_id    UUID NOT NULL REFERENCES roles (id),
        created_at TIMESTAMPTZ NOT NULL,
        created_by TEXT NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        updated_by TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_user_roles_user ON user_roles (user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS role_permissions (
        id            UUID PRIMARY KEY,
        role_id       UUID NOT NULL REFERENCES roles (id),
        permission_id UUID NOT NULL REFERENCES permissions (id),
        created_at    TIMESTAMPTZ NOT NULL,
        created_by    TEXT NOT NULL,
        updated_at    TIMESTAMPTZ NOT NULL,
        updated_by    TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_role_permissions_role ON role_permissions (role_id)",
];

/// Apply the schema. Safe to run at every startup.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StoreError::from_sqlx("run_migrations", e))?;
    }
    info!("schema migrations applied");
    Ok(())
}
