//! Role use-cases, including the role↔permission association.

use std::sync::Arc;

use chrono::Utc;

use gatehouse_auth::Caller;
use gatehouse_core::{
    AuditStamps, DomainError, DomainResult, PermissionId, RoleId, RolePermissionId, SoftDelete,
};

use crate::model::membership::{CreateRolePermission, RolePermission};
use crate::model::role::{CreateRole, Role, RolePatch};
use crate::repository::{PermissionRepository, RoleRepository};

#[derive(Clone)]
pub struct RoleService {
    roles: Arc<dyn RoleRepository>,
    permissions: Arc<dyn PermissionRepository>,
}

impl RoleService {
    pub fn new(roles: Arc<dyn RoleRepository>, permissions: Arc<dyn PermissionRepository>) -> Self {
        Self { roles, permissions }
    }

    pub async fn list(&self) -> DomainResult<Vec<Role>> {
        self.roles.list().await
    }

    pub async fn create(&self, caller: &Caller, cmd: CreateRole) -> DomainResult<RoleId> {
        if self.roles.find_by_name(&cmd.name).await?.is_some() {
            return Err(DomainError::already_exists("role_name"));
        }
        let role = Role {
            id: RoleId::new(),
            name: cmd.name,
            description: cmd.description,
            is_system: false,
            audit: AuditStamps::new(caller.actor(), Utc::now()),
            deleted: SoftDelete::default(),
        };
        self.roles.insert(role).await
    }

    /// Update role fields; a present `permission_ids` list fully replaces
    /// the role's permission grants (delete-then-bulk-insert, like user
    /// role membership).
    pub async fn update(
        &self,
        caller: &Caller,
        patch: RolePatch,
        permission_ids: Option<Vec<PermissionId>>,
    ) -> DomainResult<()> {
        let existing = self
            .roles
            .find_by_id(patch.id)
            .await?
            .ok_or_else(|| DomainError::not_found("role_id"))?;

        if let gatehouse_core::Patch::Value(name) = &patch.name {
            if let Some(other) = self.roles.find_by_name(name).await? {
                if other.id != existing.id {
                    return Err(DomainError::already_exists("role_name"));
                }
            }
        }

        if let Some(permission_ids) = permission_ids {
            self.roles.delete_role_permissions_for_role(patch.id).await?;
            let now = Utc::now();
            let rows: Vec<RolePermission> = permission_ids
                .iter()
                .map(|&pid| RolePermission::link(patch.id, pid, caller.actor(), now))
                .collect();
            self.roles.bulk_insert_role_permissions(rows).await?;
        }

        self.roles.update(patch, caller.actor()).await
    }

    pub async fn delete(&self, caller: &Caller, id: RoleId) -> DomainResult<()> {
        if self.roles.find_by_id(id).await?.is_none() {
            return Err(DomainError::not_found("role_id"));
        }
        self.roles.soft_delete(id, caller.actor()).await
    }

    pub async fn create_role_permission(
        &self,
        caller: &Caller,
        cmd: CreateRolePermission,
    ) -> DomainResult<RolePermissionId> {
        if self.roles.find_by_id(cmd.role_id).await?.is_none() {
            return Err(DomainError::not_found("role_id"));
        }
        if self.permissions.find_by_id(cmd.permission_id).await?.is_none() {
            return Err(DomainError::not_found("permission_id"));
        }
        let row = RolePermission::link(cmd.role_id, cmd.permission_id, caller.actor(), Utc::now());
        self.roles.insert_role_permission(row).await
    }

    pub async fn delete_role_permission(
        &self,
        _caller: &Caller,
        id: RolePermissionId,
    ) -> DomainResult<()> {
        if self.roles.find_role_permission(id).await?.is_none() {
            return Err(DomainError::not_found("role_permission_id"));
        }
        self.roles.delete_role_permission(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryPermissions, InMemoryRoles, permission};

    fn service() -> (RoleService, Arc<InMemoryRoles>, Arc<InMemoryPermissions>) {
        let roles = Arc::new(InMemoryRoles::default());
        let permissions = Arc::new(InMemoryPermissions::default());
        (RoleService::new(roles.clone(), permissions.clone()), roles, permissions)
    }

    #[tokio::test]
    async fn role_name_must_be_unique_case_insensitively() {
        let (service, _, _) = service();
        let caller = Caller::anonymous();
        service
            .create(&caller, CreateRole { name: "Admin".to_string(), description: None })
            .await
            .unwrap();

        let err = service
            .create(&caller, CreateRole { name: "admin".to_string(), description: None })
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::already_exists("role_name"));
    }

    #[tokio::test]
    async fn update_replaces_permission_grants() {
        let (service, roles, permissions) = service();
        let caller = Caller::anonymous();
        let role_id = service
            .create(&caller, CreateRole { name: "editor".to_string(), description: None })
            .await
            .unwrap();

        let read = permission("doc-read", Some("read"), Some("doc"));
        let write = permission("doc-write", Some("write"), Some("doc"));
        permissions.put(read.clone());
        permissions.put(write.clone());

        service
            .update(&caller, RolePatch { id: role_id, ..Default::default() }, Some(vec![read.id]))
            .await
            .unwrap();
        assert_eq!(roles.permission_count(role_id), 1);

        service
            .update(
                &caller,
                RolePatch { id: role_id, ..Default::default() },
                Some(vec![read.id, write.id]),
            )
            .await
            .unwrap();
        assert_eq!(roles.permission_count(role_id), 2);
    }

    #[tokio::test]
    async fn role_permission_create_validates_both_sides() {
        let (service, _, permissions) = service();
        let caller = Caller::anonymous();
        let role_id = service
            .create(&caller, CreateRole { name: "editor".to_string(), description: None })
            .await
            .unwrap();
        let perm = permission("doc-read", Some("read"), Some("doc"));
        permissions.put(perm.clone());

        let err = service
            .create_role_permission(
                &caller,
                CreateRolePermission { role_id: RoleId::new(), permission_id: perm.id },
            )
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("role_id"));

        service
            .create_role_permission(
                &caller,
                CreateRolePermission { role_id, permission_id: perm.id },
            )
            .await
            .unwrap();
    }
}
