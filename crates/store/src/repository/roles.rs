//! Role persistence plus the role↔permission join relation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use gatehouse_core::{
    AuditStamps, DomainError, DomainResult, PermissionId, RoleId, RolePermissionId, SoftDelete,
};
use gatehouse_identity::model::membership::RolePermission;
use gatehouse_identity::model::permission::Permission;
use gatehouse_identity::model::role::{Role, RolePatch};
use gatehouse_identity::repository::RoleRepository;

use crate::error::db_error;

const ROLE_COLUMNS: &str = r#"
    r.id, r.name, r.description, r.is_system,
    r.created_at, r.created_by, r.updated_at, r.updated_by,
    r.deleted_at, r.deleted_by
"#;

#[derive(Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    #[instrument(skip(self, role), fields(id = %role.id), err)]
    async fn insert(&self, role: Role) -> DomainResult<RoleId> {
        sqlx::query(
            r#"
            INSERT INTO roles (id, name, description, is_system, created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(role.id.as_uuid())
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.is_system)
        .bind(role.audit.created_at)
        .bind(&role.audit.created_by)
        .bind(role.audit.updated_at)
        .bind(&role.audit.updated_by)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert_role", e))?;

        Ok(role.id)
    }

    async fn find_by_id(&self, id: RoleId) -> DomainResult<Option<Role>> {
        let sql = format!(
            "SELECT {ROLE_COLUMNS} FROM roles r WHERE r.id = $1 AND r.deleted_at IS NULL LIMIT 1"
        );
        let row: Option<RoleRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find_role_by_id", e))?;
        Ok(row.map(Role::from))
    }

    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Role>> {
        let sql = format!(
            "SELECT {ROLE_COLUMNS} FROM roles r WHERE LOWER(r.name) = LOWER($1) AND r.deleted_at IS NULL LIMIT 1"
        );
        let row: Option<RoleRow> = sqlx::query_as(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find_role_by_name", e))?;
        Ok(row.map(Role::from))
    }

    async fn list(&self) -> DomainResult<Vec<Role>> {
        let sql = format!(
            "SELECT {ROLE_COLUMNS} FROM roles r WHERE r.deleted_at IS NULL ORDER BY r.name"
        );
        let rows: Vec<RoleRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list_roles", e))?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn update(&self, patch: RolePatch, actor: &str) -> DomainResult<()> {
        let (name_set, name) = patch.name.as_bind();
        let (description_set, description) = patch.description.as_bind();

        let result = sqlx::query(
            r#"
            UPDATE roles SET
                name        = CASE WHEN $1 THEN $2 ELSE name END,
                description = CASE WHEN $3 THEN $4 ELSE description END,
                updated_at = $5,
                updated_by = $6
            WHERE id = $7 AND deleted_at IS NULL
            "#,
        )
        .bind(name_set)
        .bind(name.map(String::as_str))
        .bind(description_set)
        .bind(description.map(String::as_str))
        .bind(Utc::now())
        .bind(actor)
        .bind(patch.id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update_role", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("role_id"));
        }
        Ok(())
    }

    async fn soft_delete(&self, id: RoleId, actor: &str) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE roles SET deleted_at = $1, deleted_by = $2 WHERE id = $3 AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(actor)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("delete_role", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("role_id"));
        }
        Ok(())
    }

    async fn find_role_permission(
        &self,
        id: RolePermissionId,
    ) -> DomainResult<Option<RolePermission>> {
        let row: Option<RolePermissionRow> = sqlx::query_as(
            r#"
            SELECT
                rp.id, rp.role_id, rp.permission_id,
                rp.created_at, rp.created_by, rp.updated_at, rp.updated_by,
                p.id AS joined_permission_id, p.name AS permission_name,
                p.action AS permission_action, p.resource AS permission_resource,
                p.description AS permission_description,
                p.created_at AS permission_created_at, p.created_by AS permission_created_by,
                p.updated_at AS permission_updated_at, p.updated_by AS permission_updated_by,
                p.deleted_at AS permission_deleted_at, p.deleted_by AS permission_deleted_by
            FROM role_permissions rp
            LEFT JOIN permissions p ON p.id = rp.permission_id AND p.deleted_at IS NULL
            WHERE rp.id = $1
            LIMIT 1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find_role_permission", e))?;

        Ok(row.map(RolePermission::from))
    }

    async fn insert_role_permission(&self, row: RolePermission) -> DomainResult<RolePermissionId> {
        sqlx::query(
            r#"
            INSERT INTO role_permissions (id, role_id, permission_id, created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(row.id.as_uuid())
        .bind(row.role_id.as_uuid())
        .bind(row.permission_id.as_uuid())
        .bind(row.audit.created_at)
        .bind(&row.audit.created_by)
        .bind(row.audit.updated_at)
        .bind(&row.audit.updated_by)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert_role_permission", e))?;

        Ok(row.id)
    }

    async fn bulk_insert_role_permissions(&self, rows: Vec<RolePermission>) -> DomainResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO role_permissions (id, role_id, permission_id, created_at, created_by, updated_at, updated_by) ",
        );
        qb.push_values(rows, |mut b, row| {
            b.push_bind(*row.id.as_uuid())
                .push_bind(*row.role_id.as_uuid())
                .push_bind(*row.permission_id.as_uuid())
                .push_bind(row.audit.created_at)
                .push_bind(row.audit.created_by)
                .push_bind(row.audit.updated_at)
                .push_bind(row.audit.updated_by);
        });

        qb.build()
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("bulk_insert_role_permissions", e))?;
        Ok(())
    }

    async fn delete_role_permission(&self, id: RolePermissionId) -> DomainResult<()> {
        sqlx::query("DELETE FROM role_permissions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete_role_permission", e))?;
        Ok(())
    }

    async fn delete_role_permissions_for_role(&self, role_id: RoleId) -> DomainResult<()> {
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete_role_permissions_for_role", e))?;
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    is_system: bool,
    created_at: DateTime<Utc>,
    created_by: String,
    updated_at: DateTime<Utc>,
    updated_by: String,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<String>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            id: RoleId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            is_system: row.is_system,
            audit: AuditStamps {
                created_at: row.created_at,
                created_by: row.created_by,
                updated_at: row.updated_at,
                updated_by: row.updated_by,
            },
            deleted: SoftDelete { deleted_at: row.deleted_at, deleted_by: row.deleted_by },
        }
    }
}

#[derive(Debug, FromRow)]
struct RolePermissionRow {
    id: Uuid,
    role_id: Uuid,
    permission_id: Uuid,
    created_at: DateTime<Utc>,
    created_by: String,
    updated_at: DateTime<Utc>,
    updated_by: String,
    joined_permission_id: Option<Uuid>,
    permission_name: Option<String>,
    permission_action: Option<String>,
    permission_resource: Option<String>,
    permission_description: Option<String>,
    permission_created_at: Option<DateTime<Utc>>,
    permission_created_by: Option<String>,
    permission_updated_at: Option<DateTime<Utc>>,
    permission_updated_by: Option<String>,
    permission_deleted_at: Option<DateTime<Utc>>,
    permission_deleted_by: Option<String>,
}

impl From<RolePermissionRow> for RolePermission {
    fn from(row: RolePermissionRow) -> Self {
        let permission = match (row.joined_permission_id, row.permission_name) {
            (Some(permission_id), Some(name)) => Some(Permission {
                id: PermissionId::from_uuid(permission_id),
                name,
                action: row.permission_action,
                resource: row.permission_resource,
                description: row.permission_description,
                audit: AuditStamps {
                    created_at: row.permission_created_at.unwrap_or(row.created_at),
                    created_by: row.permission_created_by.unwrap_or_default(),
                    updated_at: row.permission_updated_at.unwrap_or(row.updated_at),
                    updated_by: row.permission_updated_by.unwrap_or_default(),
                },
                deleted: SoftDelete {
                    deleted_at: row.permission_deleted_at,
                    deleted_by: row.permission_deleted_by,
                },
            }),
            _ => None,
        };

        RolePermission {
            id: RolePermissionId::from_uuid(row.id),
            role_id: RoleId::from_uuid(row.role_id),
            permission_id: PermissionId::from_uuid(row.permission_id),
            audit: AuditStamps {
                created_at: row.created_at,
                created_by: row.created_by,
                updated_at: row.updated_at,
                updated_by: row.updated_by,
            },
            permission,
        }
    }
}
