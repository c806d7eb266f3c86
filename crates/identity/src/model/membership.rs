//! Join-table rows for the two many-to-many relations.
//!
//! These rows are hard-deleted (no soft-delete) and are fully replaced on
//! membership updates rather than diffed. The `role`/`permission`
//! back-references are query-time conveniences, not stored relationships.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatehouse_core::{
    AuditStamps, Identified, PermissionId, RoleId, RolePermissionId, UserId, UserRoleId,
};

use crate::model::permission::Permission;
use crate::model::role::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub id: UserRoleId,
    pub user_id: UserId,
    pub role_id: RoleId,
    #[serde(flatten)]
    pub audit: AuditStamps,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<Role>,
}

impl UserRole {
    pub fn link(user_id: UserId, role_id: RoleId, actor: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: UserRoleId::new(),
            user_id,
            role_id,
            audit: AuditStamps::new(actor, now),
            role: None,
        }
    }
}

impl Identified for UserRole {
    type Id = UserRoleId;

    fn id(&self) -> UserRoleId {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRole {
    pub user_id: UserId,
    pub role_id: RoleId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    pub id: RolePermissionId,
    pub role_id: RoleId,
    pub permission_id: PermissionId,
    #[serde(flatten)]
    pub audit: AuditStamps,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub permission: Option<Permission>,
}

impl RolePermission {
    pub fn link(
        role_id: RoleId,
        permission_id: PermissionId,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RolePermissionId::new(),
            role_id,
            permission_id,
            audit: AuditStamps::new(actor, now),
            permission: None,
        }
    }
}

impl Identified for RolePermission {
    type Id = RolePermissionId;

    fn id(&self) -> RolePermissionId {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRolePermission {
    pub role_id: RoleId,
    pub permission_id: PermissionId,
}
