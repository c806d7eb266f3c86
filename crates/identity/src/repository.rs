//! Persistence contracts for the identity store.
//!
//! Implementations live in `gatehouse-store` (Postgres); tests use
//! in-memory doubles. All listings exclude soft-deleted rows; natural-key
//! lookups return `Ok(None)` for no match rather than an error, because
//! callers use them both as existence checks and as fetches.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gatehouse_core::{
    DomainResult, ListParams, OrgId, PermissionId, RoleId, RolePermissionId, UserId, UserRoleId,
};

use crate::model::membership::{RolePermission, UserRole};
use crate::model::organization::{Organization, OrganizationNode, OrganizationPatch};
use crate::model::permission::{Permission, PermissionPatch};
use crate::model::role::{Role, RolePatch};
use crate::model::user::{User, UserPatch};

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Insert a node with a freshly computed materialized path.
    ///
    /// The parent's *current* path must be read inside the same transaction
    /// that inserts the child, so a concurrently-moved parent could not leave
    /// a stale path behind (re-parenting is unsupported today, but the
    /// contract must not preclude detecting it). A present but unknown
    /// `parent_id` is a not-found error on that field.
    async fn create(&self, organization: Organization) -> DomainResult<OrgId>;

    /// The node plus its full descendant subtree; `None` when the root does
    /// not exist or is soft-deleted.
    async fn find_tree(&self, id: OrgId) -> DomainResult<Option<OrganizationNode>>;

    async fn find_many(&self, ids: &[OrgId]) -> DomainResult<Vec<Organization>>;

    /// Apply present fields only; absent fields keep their stored value.
    async fn update(&self, patch: OrganizationPatch, actor: &str) -> DomainResult<()>;

    async fn soft_delete(&self, id: OrgId, actor: &str) -> DomainResult<()>;

    /// Filtered page of organizations plus the unpaged total count.
    async fn list(&self, params: &ListParams) -> DomainResult<(Vec<Organization>, u64)>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: User) -> DomainResult<UserId>;
    async fn find_by_id(&self, id: UserId) -> DomainResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>>;
    async fn find_by_phone_number(&self, phone_number: &str) -> DomainResult<Option<User>>;
    async fn find_by_employee_id(&self, employee_id: &str) -> DomainResult<Option<User>>;
    async fn update(&self, patch: UserPatch, actor: &str) -> DomainResult<()>;
    async fn soft_delete(&self, id: UserId, actor: &str) -> DomainResult<()>;
    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> DomainResult<()>;
    async fn list(&self, params: &ListParams) -> DomainResult<(Vec<User>, u64)>;

    /// Roles the user currently holds via non-deleted join rows.
    async fn roles_for_user(&self, id: UserId) -> DomainResult<Vec<Role>>;
    /// Join rows (with resolved roles) for a batch of users.
    async fn user_roles_for_users(&self, ids: &[UserId]) -> DomainResult<Vec<UserRole>>;
    async fn find_user_role(&self, id: UserRoleId) -> DomainResult<Option<UserRole>>;
    async fn insert_user_role(&self, row: UserRole) -> DomainResult<UserRoleId>;
    /// Single multi-row insert, not per-row round trips.
    async fn bulk_insert_user_roles(&self, rows: Vec<UserRole>) -> DomainResult<()>;
    async fn delete_user_role(&self, id: UserRoleId) -> DomainResult<()>;
    async fn delete_user_roles_for_user(&self, user_id: UserId) -> DomainResult<()>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn insert(&self, role: Role) -> DomainResult<RoleId>;
    async fn find_by_id(&self, id: RoleId) -> DomainResult<Option<Role>>;
    /// Case-insensitive name lookup among non-deleted roles.
    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Role>>;
    async fn list(&self) -> DomainResult<Vec<Role>>;
    async fn update(&self, patch: RolePatch, actor: &str) -> DomainResult<()>;
    async fn soft_delete(&self, id: RoleId, actor: &str) -> DomainResult<()>;

    async fn find_role_permission(
        &self,
        id: RolePermissionId,
    ) -> DomainResult<Option<RolePermission>>;
    async fn insert_role_permission(&self, row: RolePermission) -> DomainResult<RolePermissionId>;
    async fn bulk_insert_role_permissions(&self, rows: Vec<RolePermission>) -> DomainResult<()>;
    async fn delete_role_permission(&self, id: RolePermissionId) -> DomainResult<()>;
    async fn delete_role_permissions_for_role(&self, role_id: RoleId) -> DomainResult<()>;
}

#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn insert(&self, permission: Permission) -> DomainResult<PermissionId>;
    async fn find_by_id(&self, id: PermissionId) -> DomainResult<Option<Permission>>;
    /// Case-insensitive match on (name, action, resource) among non-deleted
    /// permissions.
    async fn find_same(
        &self,
        name: &str,
        action: &str,
        resource: &str,
    ) -> DomainResult<Option<Permission>>;
    /// Case-insensitive match on (action, resource) excluding one
    /// permission — used so an update colliding only with itself passes.
    async fn find_same_excluding(
        &self,
        action: &str,
        resource: &str,
        exclude: PermissionId,
    ) -> DomainResult<Option<Permission>>;
    async fn update(&self, patch: PermissionPatch, actor: &str) -> DomainResult<()>;
    async fn soft_delete(&self, id: PermissionId, actor: &str) -> DomainResult<()>;
    async fn list(&self, params: &ListParams) -> DomainResult<(Vec<Permission>, u64)>;

    /// Deduplicated permissions reachable via any of the given roles; a
    /// permission granted by several roles appears once.
    async fn permissions_for_roles(&self, roles: &[RoleId]) -> DomainResult<Vec<Permission>>;
}
