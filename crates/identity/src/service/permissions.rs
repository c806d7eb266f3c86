//! Permission use-cases.
//!
//! Uniqueness of the (name, action, resource) tuple is case-insensitive and
//! checked explicitly with case-folded lookups: a plain unique constraint
//! cannot express it without a case-folding scheme in the schema.

use std::sync::Arc;

use chrono::Utc;

use gatehouse_auth::Caller;
use gatehouse_core::{
    AuditStamps, DomainError, DomainResult, ListParams, Page, Patch, PermissionId, SoftDelete,
};

use crate::model::permission::{CreatePermission, Permission, PermissionPatch};
use crate::repository::PermissionRepository;

#[derive(Clone)]
pub struct PermissionService {
    permissions: Arc<dyn PermissionRepository>,
}

impl PermissionService {
    pub fn new(permissions: Arc<dyn PermissionRepository>) -> Self {
        Self { permissions }
    }

    pub async fn create(&self, caller: &Caller, cmd: CreatePermission) -> DomainResult<PermissionId> {
        if self
            .permissions
            .find_same(&cmd.name, &cmd.action, &cmd.resource)
            .await?
            .is_some()
        {
            return Err(DomainError::already_exists("permission"));
        }

        let permission = Permission {
            id: PermissionId::new(),
            name: cmd.name,
            action: Some(cmd.action),
            resource: Some(cmd.resource),
            description: cmd.description,
            audit: AuditStamps::new(caller.actor(), Utc::now()),
            deleted: SoftDelete::default(),
        };
        self.permissions.insert(permission).await
    }

    pub async fn update(&self, caller: &Caller, patch: PermissionPatch) -> DomainResult<()> {
        let existing = self
            .permissions
            .find_by_id(patch.id)
            .await?
            .ok_or_else(|| DomainError::not_found("permission_id"))?;

        // Uniqueness is checked against the values the row will hold after
        // the patch; colliding with itself is not a conflict.
        let action = patch
            .action
            .value()
            .cloned()
            .or(existing.action)
            .unwrap_or_default();
        let resource = patch
            .resource
            .value()
            .cloned()
            .or(existing.resource)
            .unwrap_or_default();
        if self
            .permissions
            .find_same_excluding(&action, &resource, patch.id)
            .await?
            .is_some()
        {
            return Err(DomainError::already_exists("permission"));
        }

        self.permissions.update(patch, caller.actor()).await
    }

    pub async fn delete(&self, caller: &Caller, id: PermissionId) -> DomainResult<()> {
        if self.permissions.find_by_id(id).await?.is_none() {
            return Err(DomainError::not_found("permission_id"));
        }
        self.permissions.soft_delete(id, caller.actor()).await
    }

    pub async fn list(&self, params: ListParams) -> DomainResult<Page<Permission>> {
        let (items, total) = self.permissions.list(&params).await?;
        Ok(Page::new(items, params.page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryPermissions;

    fn service() -> PermissionService {
        PermissionService::new(Arc::new(InMemoryPermissions::default()))
    }

    fn cmd(name: &str, action: &str, resource: &str) -> CreatePermission {
        CreatePermission {
            name: name.to_string(),
            action: action.to_string(),
            resource: resource.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn same_tuple_is_rejected_case_insensitively() {
        let service = service();
        let caller = Caller::anonymous();
        service.create(&caller, cmd("user-read", "read", "user")).await.unwrap();

        let err = service
            .create(&caller, cmd("User-Read", "READ", "User"))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::already_exists("permission"));
    }

    #[tokio::test]
    async fn update_colliding_with_other_permission_is_rejected() {
        let service = service();
        let caller = Caller::anonymous();
        service.create(&caller, cmd("user-read", "read", "user")).await.unwrap();
        let write = service.create(&caller, cmd("user-write", "write", "user")).await.unwrap();

        let patch = PermissionPatch {
            id: write,
            action: Patch::Value("read".to_string()),
            ..Default::default()
        };
        let err = service.update(&caller, patch).await.unwrap_err();
        assert_eq!(err, DomainError::already_exists("permission"));
    }

    #[tokio::test]
    async fn update_to_own_unchanged_values_passes() {
        let service = service();
        let caller = Caller::anonymous();
        let id = service.create(&caller, cmd("user-read", "read", "user")).await.unwrap();

        let patch = PermissionPatch {
            id,
            action: Patch::Value("read".to_string()),
            resource: Patch::Value("user".to_string()),
            description: Patch::Value("can read users".to_string()),
            ..Default::default()
        };
        service.update(&caller, patch).await.unwrap();
    }

    #[tokio::test]
    async fn deleting_unknown_permission_is_not_found() {
        let service = service();
        let err = service
            .delete(&Caller::anonymous(), PermissionId::new())
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("permission_id"));
    }
}
