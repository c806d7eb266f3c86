//! Permission persistence and role→permission resolution.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use gatehouse_core::{
    AuditStamps, DomainError, DomainResult, ListParams, PermissionId, RoleId, SoftDelete,
};
use gatehouse_identity::model::permission::{Permission, PermissionPatch};
use gatehouse_identity::repository::PermissionRepository;

use crate::error::db_error;
use crate::query::{push_list_filters, push_sort_and_page};

const SEARCH_FIELDS: &[&str] = &["name", "action", "resource"];

const PERMISSION_COLUMNS: &str = r#"
    p.id, p.name, p.action, p.resource, p.description,
    p.created_at, p.created_by, p.updated_at, p.updated_by,
    p.deleted_at, p.deleted_by
"#;

#[derive(Clone)]
pub struct PgPermissionRepository {
    pool: PgPool,
}

impl PgPermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionRepository for PgPermissionRepository {
    #[instrument(skip(self, permission), fields(id = %permission.id), err)]
    async fn insert(&self, permission: Permission) -> DomainResult<PermissionId> {
        sqlx::query(
            r#"
            INSERT INTO permissions (id, name, action, resource, description, created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(permission.id.as_uuid())
        .bind(&permission.name)
        .bind(&permission.action)
        .bind(&permission.resource)
        .bind(&permission.description)
        .bind(permission.audit.created_at)
        .bind(&permission.audit.created_by)
        .bind(permission.audit.updated_at)
        .bind(&permission.audit.updated_by)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert_permission", e))?;

        Ok(permission.id)
    }

    async fn find_by_id(&self, id: PermissionId) -> DomainResult<Option<Permission>> {
        let sql = format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions p WHERE p.id = $1 AND p.deleted_at IS NULL LIMIT 1"
        );
        let row: Option<PermissionRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find_permission_by_id", e))?;
        Ok(row.map(Permission::from))
    }

    async fn find_same(
        &self,
        name: &str,
        action: &str,
        resource: &str,
    ) -> DomainResult<Option<Permission>> {
        let sql = format!(
            r#"
            SELECT {PERMISSION_COLUMNS} FROM permissions p
            WHERE LOWER(p.name) = LOWER($1)
              AND LOWER(p.action) = LOWER($2)
              AND LOWER(p.resource) = LOWER($3)
              AND p.deleted_at IS NULL
            LIMIT 1
            "#
        );
        let row: Option<PermissionRow> = sqlx::query_as(&sql)
            .bind(name)
            .bind(action)
            .bind(resource)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find_same_permission", e))?;
        Ok(row.map(Permission::from))
    }

    async fn find_same_excluding(
        &self,
        action: &str,
        resource: &str,
        exclude: PermissionId,
    ) -> DomainResult<Option<Permission>> {
        let sql = format!(
            r#"
            SELECT {PERMISSION_COLUMNS} FROM permissions p
            WHERE LOWER(p.action) = LOWER($1)
              AND LOWER(p.resource) = LOWER($2)
              AND p.id <> $3
              AND p.deleted_at IS NULL
            LIMIT 1
            "#
        );
        let row: Option<PermissionRow> = sqlx::query_as(&sql)
            .bind(action)
            .bind(resource)
            .bind(exclude.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find_same_permission_excluding", e))?;
        Ok(row.map(Permission::from))
    }

    async fn update(&self, patch: PermissionPatch, actor: &str) -> DomainResult<()> {
        let (name_set, name) = patch.name.as_bind();
        let (action_set, action) = patch.action.as_bind();
        let (resource_set, resource) = patch.resource.as_bind();
        let (description_set, description) = patch.description.as_bind();

        let result = sqlx::query(
            r#"
            UPDATE permissions SET
                name        = CASE WHEN $1 THEN $2 ELSE name END,
                action      = CASE WHEN $3 THEN $4 ELSE action END,
                resource    = CASE WHEN $5 THEN $6 ELSE resource END,
                description = CASE WHEN $7 THEN $8 ELSE description END,
                updated_at = $9,
                updated_by = $10
            WHERE id = $11 AND deleted_at IS NULL
            "#,
        )
        .bind(name_set)
        .bind(name.map(String::as_str))
        .bind(action_set)
        .bind(action.map(String::as_str))
        .bind(resource_set)
        .bind(resource.map(String::as_str))
        .bind(description_set)
        .bind(description.map(String::as_str))
        .bind(Utc::now())
        .bind(actor)
        .bind(patch.id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update_permission", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("permission_id"));
        }
        Ok(())
    }

    async fn soft_delete(&self, id: PermissionId, actor: &str) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE permissions SET deleted_at = $1, deleted_by = $2 WHERE id = $3 AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(actor)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("delete_permission", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("permission_id"));
        }
        Ok(())
    }

    async fn list(&self, params: &ListParams) -> DomainResult<(Vec<Permission>, u64)> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(p.id) FROM permissions p");
        push_list_filters(&mut count_qb, params, SEARCH_FIELDS, "p");
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("count_permissions", e))?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions p"
        ));
        push_list_filters(&mut qb, params, SEARCH_FIELDS, "p");
        push_sort_and_page(&mut qb, params, "p");

        let rows: Vec<PermissionRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list_permissions", e))?;

        Ok((
            rows.into_iter().map(Permission::from).collect(),
            total.max(0) as u64,
        ))
    }

    /// DISTINCT at the database: a permission reachable through several of
    /// the given roles comes back once.
    async fn permissions_for_roles(&self, roles: &[RoleId]) -> DomainResult<Vec<Permission>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = roles.iter().map(|id| *id.as_uuid()).collect();

        let sql = format!(
            r#"
            SELECT DISTINCT {PERMISSION_COLUMNS}
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = ANY($1) AND p.deleted_at IS NULL
            "#
        );
        let rows: Vec<PermissionRow> = sqlx::query_as(&sql)
            .bind(&uuids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("find_permissions_by_roles", e))?;

        Ok(rows.into_iter().map(Permission::from).collect())
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: Uuid,
    name: String,
    action: Option<String>,
    resource: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    created_by: String,
    updated_at: DateTime<Utc>,
    updated_by: String,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<String>,
}

impl From<PermissionRow> for Permission {
    fn from(row: PermissionRow) -> Self {
        Permission {
            id: PermissionId::from_uuid(row.id),
            name: row.name,
            action: row.action,
            resource: row.resource,
            description: row.description,
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
