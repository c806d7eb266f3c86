//! Authorization resolver.
//!
//! Computes a user's roles and flattens the permissions reachable through
//! them into `resource:action` scope strings for session claims and
//! downstream authorization checks.

use std::sync::Arc;

use gatehouse_auth::Scope;
use gatehouse_core::{DomainError, DomainResult, RoleId, UserId, collect_ids};

use crate::model::permission::Permission;
use crate::model::role::Role;
use crate::repository::{PermissionRepository, UserRepository};

/// A user with zero roles cannot be authorized for anything; callers such
/// as login must reject the attempt outright.
pub fn no_roles_error() -> DomainError {
    DomainError::not_found("roles")
}

#[derive(Clone)]
pub struct AccessResolver {
    users: Arc<dyn UserRepository>,
    permissions: Arc<dyn PermissionRepository>,
}

impl AccessResolver {
    pub fn new(users: Arc<dyn UserRepository>, permissions: Arc<dyn PermissionRepository>) -> Self {
        Self { users, permissions }
    }

    /// Roles the user currently holds.
    pub async fn roles_for_user(&self, user_id: UserId) -> DomainResult<Vec<Role>> {
        self.users.roles_for_user(user_id).await
    }

    /// Like [`Self::roles_for_user`] but an empty result is an explicit
    /// "no roles" error.
    pub async fn require_roles(&self, user_id: UserId) -> DomainResult<Vec<Role>> {
        let roles = self.roles_for_user(user_id).await?;
        if roles.is_empty() {
            return Err(no_roles_error());
        }
        Ok(roles)
    }

    /// Deduplicated permissions reachable through any of the given roles.
    /// Passing the same role twice yields the same set as passing it once.
    pub async fn permissions_for_roles(&self, roles: &[RoleId]) -> DomainResult<Vec<Permission>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }
        self.permissions.permissions_for_roles(roles).await
    }

    /// The flattened `resource:action` scope set for a user.
    ///
    /// Fails with the explicit no-roles condition for an unroled user —
    /// never an empty scope list.
    pub async fn effective_scopes(&self, user_id: UserId) -> DomainResult<Vec<Scope>> {
        let roles = self.require_roles(user_id).await?;
        let role_ids = collect_ids(&roles);
        let permissions = self.permissions_for_roles(&role_ids).await?;
        Ok(scopes_from_permissions(&permissions))
    }
}

/// Format permissions as scopes. A permission missing either `resource` or
/// `action` has no scope representation and is silently excluded.
pub fn scopes_from_permissions(permissions: &[Permission]) -> Vec<Scope> {
    permissions
        .iter()
        .filter_map(|p| {
            Scope::from_parts(p.resource.as_deref()?, p.action.as_deref()?)
        })
        .collect()
}
