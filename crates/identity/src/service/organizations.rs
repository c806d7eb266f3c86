//! Organization use-cases.

use std::sync::Arc;

use chrono::Utc;

use gatehouse_auth::Caller;
use gatehouse_core::{DomainError, DomainResult, ListParams, OrgId, Page};

use crate::model::organization::{
    CreateOrganization, Organization, OrganizationNode, OrganizationPatch,
};
use crate::repository::OrganizationRepository;

#[derive(Clone)]
pub struct OrganizationService {
    organizations: Arc<dyn OrganizationRepository>,
}

impl OrganizationService {
    pub fn new(organizations: Arc<dyn OrganizationRepository>) -> Self {
        Self { organizations }
    }

    /// Create a node under an optional parent.
    ///
    /// The repository computes the materialized path from the parent's
    /// current path in the same transaction as the insert.
    pub async fn create(&self, caller: &Caller, cmd: CreateOrganization) -> DomainResult<OrgId> {
        let organization = Organization::build(cmd, caller.actor(), Utc::now());
        self.organizations.create(organization).await
    }

    /// The node plus its full descendant subtree.
    pub async fn show(&self, _caller: &Caller, id: OrgId) -> DomainResult<OrganizationNode> {
        self.organizations
            .find_tree(id)
            .await?
            .ok_or_else(|| DomainError::not_found("organization_id"))
    }

    pub async fn list(
        &self,
        _caller: &Caller,
        params: ListParams,
    ) -> DomainResult<Page<Organization>> {
        let (items, total) = self.organizations.list(&params).await?;
        Ok(Page::new(items, params.page, total))
    }

    pub async fn update(&self, caller: &Caller, patch: OrganizationPatch) -> DomainResult<()> {
        if self.organizations.find_tree(patch.id).await?.is_none() {
            return Err(DomainError::not_found("organization_id"));
        }
        self.organizations.update(patch, caller.actor()).await
    }

    pub async fn delete(&self, caller: &Caller, id: OrgId) -> DomainResult<()> {
        if self.organizations.find_tree(id).await?.is_none() {
            return Err(DomainError::not_found("organization_id"));
        }
        self.organizations.soft_delete(id, caller.actor()).await
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_core::Patch;

    use super::*;
    use crate::testing::InMemoryOrganizations;

    fn service() -> (OrganizationService, Arc<InMemoryOrganizations>) {
        let repo = Arc::new(InMemoryOrganizations::default());
        (OrganizationService::new(repo.clone()), repo)
    }

    fn create_cmd(name: &str, parent_id: Option<OrgId>) -> CreateOrganization {
        CreateOrganization {
            name: name.to_string(),
            address: Some("Main St 1".to_string()),
            latitude: None,
            longitude: None,
            kind: Some("office".to_string()),
            parent_id,
        }
    }

    #[tokio::test]
    async fn create_root_then_child_builds_paths_and_subtree() {
        let (service, repo) = service();
        let caller = Caller::anonymous();

        let hq = service.create(&caller, create_cmd("HQ", None)).await.unwrap();
        assert_eq!(repo.get(hq).unwrap().path, Some(hq.to_string()));

        let branch = service.create(&caller, create_cmd("Branch", Some(hq))).await.unwrap();
        assert_eq!(repo.get(branch).unwrap().path, Some(format!("{hq}.{branch}")));
        assert_eq!(repo.get(branch).unwrap().level, 1);

        let tree = service.show(&caller, hq).await.unwrap();
        assert_eq!(tree.organization.id, hq);
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].organization.id, branch);

        // The child's subtree must not contain the ancestor.
        let child_tree = service.show(&caller, branch).await.unwrap();
        assert!(!child_tree.contains(hq));
    }

    #[tokio::test]
    async fn create_under_unknown_parent_is_field_not_found() {
        let (service, _) = service();
        let err = service
            .create(&Caller::anonymous(), create_cmd("Branch", Some(OrgId::new())))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("parent_id"));
    }

    #[tokio::test]
    async fn partial_update_touches_only_present_fields() {
        let (service, repo) = service();
        let caller = Caller::anonymous();
        let id = service.create(&caller, create_cmd("HQ", None)).await.unwrap();
        let before = repo.get(id).unwrap();

        let patch = OrganizationPatch {
            id,
            address: Patch::Value("Elsewhere 2".to_string()),
            ..Default::default()
        };
        service.update(&caller, patch).await.unwrap();

        let after = repo.get(id).unwrap();
        assert_eq!(after.address.as_deref(), Some("Elsewhere 2"));
        assert_eq!(after.name, before.name);
        assert_eq!(after.kind, before.kind);
        assert_eq!(after.path, before.path);
    }

    #[tokio::test]
    async fn deleted_organization_is_not_found() {
        let (service, _) = service();
        let caller = Caller::anonymous();
        let id = service.create(&caller, create_cmd("HQ", None)).await.unwrap();

        service.delete(&caller, id).await.unwrap();
        let err = service.show(&caller, id).await.unwrap_err();
        assert_eq!(err, DomainError::not_found("organization_id"));
    }
}
