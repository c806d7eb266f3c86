//! Organization persistence, including the materialized-path subtree
//! query.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use gatehouse_core::{AuditStamps, DomainError, DomainResult, ListParams, OrgId, SoftDelete};
use gatehouse_identity::hierarchy;
use gatehouse_identity::model::organization::{
    Organization, OrganizationNode, OrganizationPatch,
};
use gatehouse_identity::repository::OrganizationRepository;

use crate::error::db_error;
use crate::query::{push_list_filters, push_sort_and_page};
use crate::tx::TxManager;

const SEARCH_FIELDS: &[&str] = &["name", "code"];

#[derive(Clone)]
pub struct PgOrganizationRepository {
    pool: PgPool,
    tx: TxManager,
}

impl PgOrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        let tx = TxManager::new(pool.clone());
        Self { pool, tx }
    }
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    /// The parent's current path is read and the child inserted inside one
    /// transaction, so the stored path can never be built from a stale
    /// parent read.
    #[instrument(skip(self, organization), fields(id = %organization.id), err)]
    async fn create(&self, mut organization: Organization) -> DomainResult<OrgId> {
        self.tx
            .atomic(move |tx| {
                Box::pin(async move {
                    let parent_path: Option<String> = match organization.parent_id {
                        Some(parent_id) => {
                            let row: Option<(Option<String>,)> = sqlx::query_as(
                                "SELECT path FROM organizations WHERE id = $1 AND deleted_at IS NULL",
                            )
                            .bind(parent_id.as_uuid())
                            .fetch_optional(&mut **tx)
                            .await
                            .map_err(|e| db_error("find_parent_path", e))?;

                            match row {
                                Some((path,)) => path,
                                None => return Err(DomainError::not_found("parent_id")),
                            }
                        }
                        None => None,
                    };

                    organization.assign_path(parent_path.as_deref());

                    sqlx::query(
                        r#"
                        INSERT INTO organizations (
                            id, name, code, address, latitude, longitude, type,
                            parent_id, path, level, is_active,
                            created_at, created_by, updated_at, updated_by
                        )
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                        "#,
                    )
                    .bind(organization.id.as_uuid())
                    .bind(&organization.name)
                    .bind(&organization.code)
                    .bind(&organization.address)
                    .bind(&organization.latitude)
                    .bind(&organization.longitude)
                    .bind(&organization.kind)
                    .bind(organization.parent_id.map(Uuid::from))
                    .bind(&organization.path)
                    .bind(organization.level)
                    .bind(organization.is_active)
                    .bind(organization.audit.created_at)
                    .bind(&organization.audit.created_by)
                    .bind(organization.audit.updated_at)
                    .bind(&organization.audit.updated_by)
                    .execute(&mut **tx)
                    .await
                    .map_err(|e| db_error("insert_organization", e))?;

                    Ok(organization.id)
                })
            })
            .await
    }

    /// One query: the root row plus every row whose path has the root's
    /// path as a dot-prefix, ordered by path so parents stream before
    /// their children.
    #[instrument(skip(self), fields(id = %id), err)]
    async fn find_tree(&self, id: OrgId) -> DomainResult<Option<OrganizationNode>> {
        let rows: Vec<OrganizationRow> = sqlx::query_as(
            r#"
            WITH target AS (
                SELECT id, path FROM organizations WHERE id = $1 AND deleted_at IS NULL
            )
            SELECT
                o.id, o.name, o.code, o.address, o.latitude, o.longitude,
                o.type AS kind, o.parent_id, o.path, o.level, o.is_active,
                o.created_at, o.created_by, o.updated_at, o.updated_by,
                o.deleted_at, o.deleted_by
            FROM organizations o, target t
            WHERE o.deleted_at IS NULL
              AND (o.id = t.id OR o.path LIKE t.path || '.%')
            ORDER BY o.path
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("find_organization_tree", e))?;

        Ok(hierarchy::build_tree(
            id,
            rows.into_iter().map(Organization::from).collect(),
        ))
    }

    async fn find_many(&self, ids: &[OrgId]) -> DomainResult<Vec<Organization>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();

        let rows: Vec<OrganizationRow> = sqlx::query_as(
            r#"
            SELECT
                o.id, o.name, o.code, o.address, o.latitude, o.longitude,
                o.type AS kind, o.parent_id, o.path, o.level, o.is_active,
                o.created_at, o.created_by, o.updated_at, o.updated_by,
                o.deleted_at, o.deleted_by
            FROM organizations o
            WHERE o.id = ANY($1) AND o.deleted_at IS NULL
            "#,
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("find_organizations_by_ids", e))?;

        Ok(rows.into_iter().map(Organization::from).collect())
    }

    #[instrument(skip(self, patch), fields(id = %patch.id), err)]
    async fn update(&self, patch: OrganizationPatch, actor: &str) -> DomainResult<()> {
        let (name_set, name) = patch.name.as_bind();
        let (address_set, address) = patch.address.as_bind();
        let (kind_set, kind) = patch.kind.as_bind();

        let result = sqlx::query(
            r#"
            UPDATE organizations SET
                name    = CASE WHEN $1 THEN $2 ELSE name END,
                address = CASE WHEN $3 THEN $4 ELSE address END,
                type    = CASE WHEN $5 THEN $6 ELSE type END,
                updated_at = $7,
                updated_by = $8
            WHERE id = $9 AND deleted_at IS NULL
            "#,
        )
        .bind(name_set)
        .bind(name.map(String::as_str))
        .bind(address_set)
        .bind(address.map(String::as_str))
        .bind(kind_set)
        .bind(kind.map(String::as_str))
        .bind(Utc::now())
        .bind(actor)
        .bind(patch.id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update_organization", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("organization_id"));
        }
        Ok(())
    }

    async fn soft_delete(&self, id: OrgId, actor: &str) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE organizations SET deleted_at = $1, deleted_by = $2 WHERE id = $3 AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(actor)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("delete_organization", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("organization_id"));
        }
        Ok(())
    }

    async fn list(&self, params: &ListParams) -> DomainResult<(Vec<Organization>, u64)> {
        let mut count_qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(s.id) FROM organizations s");
        push_list_filters(&mut count_qb, params, SEARCH_FIELDS, "s");
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("count_organizations", e))?;

        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                s.id, s.name, s.code, s.address, s.latitude, s.longitude,
                s.type AS kind, s.parent_id, s.path, s.level, s.is_active,
                s.created_at, s.created_by, s.updated_at, s.updated_by,
                s.deleted_at, s.deleted_by
            FROM organizations s
            "#,
        );
        push_list_filters(&mut qb, params, SEARCH_FIELDS, "s");
        push_sort_and_page(&mut qb, params, "s");

        let rows: Vec<OrganizationRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list_organizations", e))?;

        Ok((
            rows.into_iter().map(Organization::from).collect(),
            total.max(0) as u64,
        ))
    }
}

#[derive(Debug, FromRow)]
struct OrganizationRow {
    id: Uuid,
    name: String,
    code: String,
    address: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    kind: Option<String>,
    parent_id: Option<Uuid>,
    path: Option<String>,
    level: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    created_by: String,
    updated_at: DateTime<Utc>,
    updated_by: String,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<String>,
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Organization {
            id: OrgId::from_uuid(row.id),
            name: row.name,
            code: row.code,
            address: row.address,
            latitude: row.latitude,
            longitude: row.longitude,
            kind: row.kind,
            parent_id: row.parent_id.map(OrgId::from_uuid),
            path: row.path,
            level: row.level,
            is_active: row.is_active,
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
