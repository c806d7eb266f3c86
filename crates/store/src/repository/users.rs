//! User persistence plus the user↔role join relation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use gatehouse_core::{
    AuditStamps, DomainError, DomainResult, ListParams, OrgId, RoleId, SoftDelete, UserId,
    UserRoleId,
};
use gatehouse_identity::model::membership::UserRole;
use gatehouse_identity::model::role::Role;
use gatehouse_identity::model::user::{User, UserPatch};
use gatehouse_identity::repository::UserRepository;

use crate::error::db_error;
use crate::query::{push_list_filters, push_sort_and_page};

const SEARCH_FIELDS: &[&str] = &["username", "first_name", "last_name", "employee_id"];

const USER_COLUMNS: &str = r#"
    u.id, u.employee_id, u.username, u.email, u.first_name, u.last_name,
    u.phone_number, u.password_hash, u.organization_id, u.is_active,
    u.last_login_at, u.avatar_gradient_start, u.avatar_gradient_end,
    u.created_at, u.created_by, u.updated_at, u.updated_by,
    u.deleted_at, u.deleted_by
"#;

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, operation: &str, condition: &str, value: &str) -> DomainResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE {condition} AND u.deleted_at IS NULL LIMIT 1"
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(operation, e))?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self, user), fields(id = %user.id), err)]
    async fn insert(&self, user: User) -> DomainResult<UserId> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, employee_id, username, email, first_name, last_name,
                phone_number, password_hash, organization_id, is_active,
                avatar_gradient_start, avatar_gradient_end,
                created_at, created_by, updated_at, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.employee_id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone_number)
        .bind(&user.password_hash)
        .bind(user.organization_id.as_uuid())
        .bind(user.is_active)
        .bind(&user.avatar_gradient_start)
        .bind(&user.avatar_gradient_end)
        .bind(user.audit.created_at)
        .bind(&user.audit.created_by)
        .bind(user.audit.updated_at)
        .bind(&user.audit.updated_by)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert_user", e))?;

        Ok(user.id)
    }

    async fn find_by_id(&self, id: UserId) -> DomainResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1 AND u.deleted_at IS NULL LIMIT 1"
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find_user_by_id", e))?;
        Ok(row.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        self.find_one("find_user_by_username", "u.username = $1", username).await
    }

    async fn find_by_phone_number(&self, phone_number: &str) -> DomainResult<Option<User>> {
        self.find_one("find_user_by_phone_number", "u.phone_number = $1", phone_number).await
    }

    async fn find_by_employee_id(&self, employee_id: &str) -> DomainResult<Option<User>> {
        self.find_one("find_user_by_employee_id", "u.employee_id = $1", employee_id).await
    }

    #[instrument(skip(self, patch), fields(id = %patch.id), err)]
    async fn update(&self, patch: UserPatch, actor: &str) -> DomainResult<()> {
        let (employee_id_set, employee_id) = patch.employee_id.as_bind();
        let (username_set, username) = patch.username.as_bind();
        let (email_set, email) = patch.email.as_bind();
        let (first_name_set, first_name) = patch.first_name.as_bind();
        let (last_name_set, last_name) = patch.last_name.as_bind();
        let (phone_set, phone) = patch.phone_number.as_bind();
        let (password_set, password) = patch.password_hash.as_bind();

        let result = sqlx::query(
            r#"
            UPDATE users SET
                employee_id   = CASE WHEN $1 THEN $2 ELSE employee_id END,
                username      = CASE WHEN $3 THEN $4 ELSE username END,
                email         = CASE WHEN $5 THEN $6 ELSE email END,
                first_name    = CASE WHEN $7 THEN $8 ELSE first_name END,
                last_name     = CASE WHEN $9 THEN $10 ELSE last_name END,
                phone_number  = CASE WHEN $11 THEN $12 ELSE phone_number END,
                password_hash = CASE WHEN $13 THEN $14 ELSE password_hash END,
                updated_at = $15,
                updated_by = $16
            WHERE id = $17 AND deleted_at IS NULL
            "#,
        )
        .bind(employee_id_set)
        .bind(employee_id.map(String::as_str))
        .bind(username_set)
        .bind(username.map(String::as_str))
        .bind(email_set)
        .bind(email.map(String::as_str))
        .bind(first_name_set)
        .bind(first_name.map(String::as_str))
        .bind(last_name_set)
        .bind(last_name.map(String::as_str))
        .bind(phone_set)
        .bind(phone.map(String::as_str))
        .bind(password_set)
        .bind(password.map(String::as_str))
        .bind(Utc::now())
        .bind(actor)
        .bind(patch.id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update_user", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("user_id"));
        }
        Ok(())
    }

    async fn soft_delete(&self, id: UserId, actor: &str) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = $1, deleted_by = $2 WHERE id = $3 AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(actor)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("delete_user", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("user_id"));
        }
        Ok(())
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> DomainResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $1 WHERE id = $2")
            .bind(at)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("record_login", e))?;
        Ok(())
    }

    async fn list(&self, params: &ListParams) -> DomainResult<(Vec<User>, u64)> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(u.id) FROM users u");
        push_list_filters(&mut count_qb, params, SEARCH_FIELDS, "u");
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("count_users", e))?;

        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users u"));
        push_list_filters(&mut qb, params, SEARCH_FIELDS, "u");
        push_sort_and_page(&mut qb, params, "u");

        let rows: Vec<UserRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list_users", e))?;

        Ok((rows.into_iter().map(User::from).collect(), total.max(0) as u64))
    }

    async fn roles_for_user(&self, id: UserId) -> DomainResult<Vec<Role>> {
        let rows: Vec<RoleRow> = sqlx::query_as(
            r#"
            SELECT
                r.id, r.name, r.description, r.is_system,
                r.created_at, r.created_by, r.updated_at, r.updated_by,
                r.deleted_at, r.deleted_by
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1 AND r.deleted_at IS NULL
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("find_roles_by_user", e))?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn user_roles_for_users(&self, ids: &[UserId]) -> DomainResult<Vec<UserRole>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();

        let rows: Vec<UserRoleRow> = sqlx::query_as(
            r#"
            SELECT
                ur.id, ur.user_id, ur.role_id,
                ur.created_at, ur.created_by, ur.updated_at, ur.updated_by,
                r.id AS joined_role_id, r.name AS role_name,
                r.description AS role_description, r.is_system AS role_is_system,
                r.created_at AS role_created_at, r.created_by AS role_created_by,
                r.updated_at AS role_updated_at, r.updated_by AS role_updated_by,
                r.deleted_at AS role_deleted_at, r.deleted_by AS role_deleted_by
            FROM user_roles ur
            LEFT JOIN roles r ON r.id = ur.role_id AND r.deleted_at IS NULL
            WHERE ur.user_id = ANY($1)
            "#,
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("find_user_roles_by_users", e))?;

        Ok(rows.into_iter().map(UserRole::from).collect())
    }

    async fn find_user_role(&self, id: UserRoleId) -> DomainResult<Option<UserRole>> {
        let row: Option<UserRoleRow> = sqlx::query_as(
            r#"
            SELECT
                ur.id, ur.user_id, ur.role_id,
                ur.created_at, ur.created_by, ur.updated_at, ur.updated_by,
                r.id AS joined_role_id, r.name AS role_name,
                r.description AS role_description, r.is_system AS role_is_system,
                r.created_at AS role_created_at, r.created_by AS role_created_by,
                r.updated_at AS role_updated_at, r.updated_by AS role_updated_by,
                r.deleted_at AS role_deleted_at, r.deleted_by AS role_deleted_by
            FROM user_roles ur
            LEFT JOIN roles r ON r.id = ur.role_id AND r.deleted_at IS NULL
            WHERE ur.id = $1
            LIMIT 1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find_user_role", e))?;

        Ok(row.map(UserRole::from))
    }

    async fn insert_user_role(&self, row: UserRole) -> DomainResult<UserRoleId> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (id, user_id, role_id, created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(row.id.as_uuid())
        .bind(row.user_id.as_uuid())
        .bind(row.role_id.as_uuid())
        .bind(row.audit.created_at)
        .bind(&row.audit.created_by)
        .bind(row.audit.updated_at)
        .bind(&row.audit.updated_by)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert_user_role", e))?;

        Ok(row.id)
    }

    async fn bulk_insert_user_roles(&self, rows: Vec<UserRole>) -> DomainResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO user_roles (id, user_id, role_id, created_at, created_by, updated_at, updated_by) ",
        );
        qb.push_values(rows, |mut b, row| {
            b.push_bind(*row.id.as_uuid())
                .push_bind(*row.user_id.as_uuid())
                .push_bind(*row.role_id.as_uuid())
                .push_bind(row.audit.created_at)
                .push_bind(row.audit.created_by)
                .push_bind(row.audit.updated_at)
                .push_bind(row.audit.updated_by);
        });

        qb.build()
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("bulk_insert_user_roles", e))?;
        Ok(())
    }

    async fn delete_user_role(&self, id: UserRoleId) -> DomainResult<()> {
        sqlx::query("DELETE FROM user_roles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete_user_role", e))?;
        Ok(())
    }

    async fn delete_user_roles_for_user(&self, user_id: UserId) -> DomainResult<()> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete_user_roles_for_user", e))?;
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    employee_id: String,
    username: String,
    email: Option<String>,
    first_name: String,
    last_name: Option<String>,
    phone_number: String,
    password_hash: String,
    organization_id: Uuid,
    is_active: bool,
    last_login_at: Option<DateTime<Utc>>,
    avatar_gradient_start: Option<String>,
    avatar_gradient_end: Option<String>,
    created_at: DateTime<Utc>,
    created_by: String,
    updated_at: DateTime<Utc>,
    updated_by: String,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            employee_id: row.employee_id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone_number: row.phone_number,
            password_hash: row.password_hash,
            organization_id: OrgId::from_uuid(row.organization_id),
            is_active: row.is_active,
            last_login_at: row.last_login_at,
            avatar_gradient_start: row.avatar_gradient_start,
            avatar_gradient_end: row.avatar_gradient_end,
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
struct UserRoleRow {
    id: Uuid,
    user_id: Uuid,
    role_id: Uuid,
    created_at: DateTime<Utc>,
    created_by: String,
    updated_at: DateTime<Utc>,
    updated_by: String,
    joined_role_id: Option<Uuid>,
    role_name: Option<String>,
    role_description: Option<String>,
    role_is_system: Option<bool>,
    role_created_at: Option<DateTime<Utc>>,
    role_created_by: Option<String>,
    role_updated_at: Option<DateTime<Utc>>,
    role_updated_by: Option<String>,
    role_deleted_at: Option<DateTime<Utc>>,
    role_deleted_by: Option<String>,
}

impl From<UserRoleRow> for UserRole {
    fn from(row: UserRoleRow) -> Self {
        let role = match (row.joined_role_id, row.role_name) {
            (Some(role_id), Some(name)) => Some(Role {
                id: RoleId::from_uuid(role_id),
                name,
                description: row.role_description,
                is_system: row.role_is_system.unwrap_or(false),
                audit: AuditStamps {
                    created_at: row.role_created_at.unwrap_or(row.created_at),
                    created_by: row.role_created_by.unwrap_or_default(),
                    updated_at: row.role_updated_at.unwrap_or(row.updated_at),
                    updated_by: row.role_updated_by.unwrap_or_default(),
                },
                deleted: SoftDelete {
                    deleted_at: row.role_deleted_at,
                    deleted_by: row.role_deleted_by,
                },
            }),
            _ => None,
        };

        UserRole {
            id: UserRoleId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            role_id: RoleId::from_uuid(row.role_id),
            audit: AuditStamps {
                created_at: row.created_at,
                created_by: row.created_by,
                updated_at: row.updated_at,
                updated_by: row.updated_by,
            },
            role,
        }
    }
}
