//! User use-cases: registration, session issuance, profile management and
//! role membership.

use std::sync::Arc;

use chrono::Utc;

use gatehouse_auth::{Caller, ClaimRole, SessionClaims, TokenCodec, hash_password, verify_password};
use gatehouse_core::{
    DomainError, DomainResult, ListParams, Page, Patch, RoleId, UserId, UserRoleId, collect_ids,
    index_by,
};

use crate::access::{AccessResolver, scopes_from_permissions};
use crate::gradient::gradient_for_seed;
use crate::model::membership::{CreateUserRole, UserRole};
use crate::model::user::{CreateUser, OrganizationSummary, User, UserDetail, UserPatch, UserSummary};
use crate::repository::{OrganizationRepository, RoleRepository, UserRepository};

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Partial user update; the password arrives in plaintext and is hashed
/// here, and a present `role_ids` list fully replaces the membership.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub employee_id: Patch<String>,
    pub username: Patch<String>,
    pub email: Patch<String>,
    pub first_name: Patch<String>,
    pub last_name: Patch<String>,
    pub phone_number: Patch<String>,
    pub password: Patch<String>,
    pub role_ids: Option<Vec<RoleId>>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    roles: Arc<dyn RoleRepository>,
    resolver: AccessResolver,
    tokens: Arc<TokenCodec>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        roles: Arc<dyn RoleRepository>,
        resolver: AccessResolver,
        tokens: Arc<TokenCodec>,
    ) -> Self {
        Self { users, organizations, roles, resolver, tokens }
    }

    pub async fn create(&self, caller: &Caller, cmd: CreateUser) -> DomainResult<UserId> {
        if self.users.find_by_username(&cmd.username.to_lowercase()).await?.is_some() {
            return Err(DomainError::already_exists("username"));
        }
        if self.users.find_by_phone_number(&cmd.phone_number).await?.is_some() {
            return Err(DomainError::already_exists("phone_number"));
        }
        if self.users.find_by_employee_id(&cmd.employee_id).await?.is_some() {
            return Err(DomainError::already_exists("employee_id"));
        }
        if self.organizations.find_tree(cmd.organization_id).await?.is_none() {
            return Err(DomainError::not_found("organization_id"));
        }

        let now = Utc::now();
        let password_hash = hash_password(&cmd.password)?;
        let (gradient_start, gradient_end) = gradient_for_seed(&cmd.username);

        let user = User {
            id: UserId::new(),
            employee_id: cmd.employee_id,
            username: cmd.username.to_lowercase(),
            email: cmd.email,
            first_name: cmd.first_name,
            last_name: cmd.last_name,
            phone_number: cmd.phone_number,
            password_hash,
            organization_id: cmd.organization_id,
            is_active: true,
            last_login_at: None,
            avatar_gradient_start: Some(gradient_start.to_string()),
            avatar_gradient_end: Some(gradient_end.to_string()),
            audit: gatehouse_core::AuditStamps::new(caller.actor(), now),
            deleted: Default::default(),
        };

        let user_id = self.users.insert(user).await?;

        let rows: Vec<UserRole> = cmd
            .role_ids
            .iter()
            .map(|&role_id| UserRole::link(user_id, role_id, caller.actor(), now))
            .collect();
        self.users.bulk_insert_user_roles(rows).await?;

        Ok(user_id)
    }

    /// Authenticate and issue a session token.
    ///
    /// A user with zero roles is rejected outright — an unroled identity
    /// cannot be authorized for anything.
    pub async fn login(&self, cmd: LoginRequest) -> DomainResult<String> {
        let user = self
            .users
            .find_by_username(&cmd.username.to_lowercase())
            .await?
            .ok_or_else(|| DomainError::not_found("username"))?;

        if !verify_password(&cmd.password, &user.password_hash)? {
            return Err(DomainError::invalid("password", "invalid"));
        }

        let roles = self.resolver.require_roles(user.id).await?;

        if self.organizations.find_tree(user.organization_id).await?.is_none() {
            return Err(DomainError::not_found("organization_id"));
        }

        let now = Utc::now();
        self.users.record_login(user.id, now).await?;

        let claim_roles = roles
            .into_iter()
            .map(|r| ClaimRole { id: r.id, name: r.name })
            .collect();
        let claims = SessionClaims::new(
            user.id,
            user.username,
            claim_roles,
            user.organization_id,
            now,
        );
        Ok(self.tokens.issue(&claims)?)
    }

    /// The full user view: profile, roles, resolved permissions/scopes and
    /// the organization subtree.
    pub async fn show(&self, id: UserId) -> DomainResult<UserDetail> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user_id"))?;

        let roles = self.resolver.roles_for_user(id).await?;
        let role_ids = collect_ids(&roles);
        let permissions = self.resolver.permissions_for_roles(&role_ids).await?;
        let scopes = scopes_from_permissions(&permissions);

        let organization = self
            .organizations
            .find_tree(user.organization_id)
            .await?
            .ok_or_else(|| DomainError::not_found("organization_id"))?;

        Ok(UserDetail { user, roles, permissions, scopes, organization })
    }

    pub async fn update(&self, caller: &Caller, id: UserId, cmd: UpdateUser) -> DomainResult<()> {
        if let Patch::Value(username) = &cmd.username {
            if let Some(existing) = self.users.find_by_username(username).await? {
                if existing.id != id {
                    return Err(DomainError::already_exists("username"));
                }
            }
        }
        if let Patch::Value(employee_id) = &cmd.employee_id {
            if let Some(existing) = self.users.find_by_employee_id(employee_id).await? {
                if existing.id != id {
                    return Err(DomainError::already_exists("employee_id"));
                }
            }
        }

        let password_hash = match &cmd.password {
            Patch::Value(plain) => Patch::Value(hash_password(plain)?),
            _ => Patch::Missing,
        };

        if let Some(role_ids) = &cmd.role_ids {
            // Replace, not diff. The delete and the bulk insert are separate
            // statements with no shared transaction; a crash in between
            // leaves the user with zero memberships. Known window, kept
            // deliberately visible rather than silently rewired.
            self.users.delete_user_roles_for_user(id).await?;
            let now = Utc::now();
            let rows: Vec<UserRole> = role_ids
                .iter()
                .map(|&role_id| UserRole::link(id, role_id, caller.actor(), now))
                .collect();
            self.users.bulk_insert_user_roles(rows).await?;
        }

        let patch = UserPatch {
            id,
            employee_id: cmd.employee_id,
            username: cmd.username,
            email: cmd.email,
            first_name: cmd.first_name,
            last_name: cmd.last_name,
            phone_number: cmd.phone_number,
            password_hash,
        };
        self.users.update(patch, caller.actor()).await
    }

    pub async fn change_password(
        &self,
        caller: &Caller,
        id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> DomainResult<()> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user_id"))?;

        if !verify_password(old_password, &user.password_hash)? {
            return Err(DomainError::invalid("old_password", "invalid"));
        }

        let patch = UserPatch {
            id,
            password_hash: Patch::Value(hash_password(new_password)?),
            ..Default::default()
        };
        self.users.update(patch, caller.actor()).await
    }

    pub async fn delete(&self, caller: &Caller, id: UserId) -> DomainResult<()> {
        if self.users.find_by_id(id).await?.is_none() {
            return Err(DomainError::not_found("user_id"));
        }
        self.users.soft_delete(id, caller.actor()).await
    }

    /// Page of users decorated with roles and organization summaries, both
    /// fetched in single batched queries and stitched in memory.
    pub async fn list(&self, _caller: &Caller, params: ListParams) -> DomainResult<Page<UserSummary>> {
        let (users, total) = self.users.list(&params).await?;

        let user_ids = collect_ids(&users);
        let user_roles = self.users.user_roles_for_users(&user_ids).await?;

        let org_ids: Vec<_> = {
            let mut seen = std::collections::HashSet::new();
            users.iter().filter(|u| seen.insert(u.organization_id)).map(|u| u.organization_id).collect()
        };
        let organizations = self.organizations.find_many(&org_ids).await?;
        let orgs_by_id = index_by(&organizations);

        let mut summaries: Vec<UserSummary> = users
            .into_iter()
            .map(|user| {
                let organization = orgs_by_id.get(&user.organization_id).map(|o| OrganizationSummary {
                    id: o.id,
                    name: o.name.clone(),
                    kind: o.kind.clone(),
                });
                UserSummary { user, roles: Vec::new(), organization }
            })
            .collect();

        let index: std::collections::HashMap<UserId, usize> = summaries
            .iter()
            .enumerate()
            .map(|(i, s)| (s.user.id, i))
            .collect();
        for row in user_roles {
            if let (Some(&i), Some(role)) = (index.get(&row.user_id), row.role) {
                summaries[i].roles.push(role);
            }
        }

        Ok(Page::new(summaries, params.page, total))
    }

    pub async fn create_user_role(&self, caller: &Caller, cmd: CreateUserRole) -> DomainResult<UserRoleId> {
        if self.users.find_by_id(cmd.user_id).await?.is_none() {
            return Err(DomainError::not_found("user_id"));
        }
        if self.roles.find_by_id(cmd.role_id).await?.is_none() {
            return Err(DomainError::not_found("role_id"));
        }
        let row = UserRole::link(cmd.user_id, cmd.role_id, caller.actor(), Utc::now());
        self.users.insert_user_role(row).await
    }

    pub async fn delete_user_role(&self, _caller: &Caller, id: UserRoleId) -> DomainResult<()> {
        if self.users.find_user_role(id).await?.is_none() {
            return Err(DomainError::not_found("user_role_id"));
        }
        self.users.delete_user_role(id).await
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_core::OrgId;

    use super::*;
    use crate::testing::{
        InMemoryOrganizations, InMemoryPermissions, InMemoryRoles, InMemoryUsers, organization,
        role, user,
    };

    struct Fixture {
        service: UserService,
        users: Arc<InMemoryUsers>,
        roles: Arc<InMemoryRoles>,
        tokens: Arc<TokenCodec>,
        org_id: OrgId,
    }

    async fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUsers::default());
        let organizations = Arc::new(InMemoryOrganizations::default());
        let roles = Arc::new(InMemoryRoles::default());
        let permissions = Arc::new(InMemoryPermissions::default());
        let tokens = Arc::new(TokenCodec::new(b"test-secret"));

        let mut org = organization("HQ", None);
        org.assign_path(None);
        let org_id = org.id;
        organizations.put(org);

        let resolver = AccessResolver::new(users.clone(), permissions);
        let service = UserService::new(
            users.clone(),
            organizations,
            roles.clone(),
            resolver,
            tokens.clone(),
        );
        Fixture { service, users, roles, tokens, org_id }
    }

    fn create_cmd(username: &str, org_id: OrgId, role_ids: Vec<RoleId>) -> CreateUser {
        CreateUser {
            employee_id: format!("emp-{username}"),
            username: username.to_string(),
            email: None,
            first_name: username.to_string(),
            last_name: None,
            phone_number: format!("08120000{username}"),
            password: "Sup3r-secret!".to_string(),
            organization_id: org_id,
            role_ids,
        }
    }

    #[tokio::test]
    async fn create_hashes_password_and_attaches_roles() {
        let f = fixture().await;
        let admin = role("admin");
        f.roles.put(admin.clone());

        let id = f
            .service
            .create(&Caller::anonymous(), create_cmd("alice", f.org_id, vec![admin.id]))
            .await
            .unwrap();

        let stored = f.users.get(id).unwrap();
        assert_ne!(stored.password_hash, "Sup3r-secret!");
        assert!(verify_password("Sup3r-secret!", &stored.password_hash).unwrap());
        assert_eq!(f.users.role_count(id), 1);
        assert!(stored.avatar_gradient_start.is_some());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let f = fixture().await;
        f.service
            .create(&Caller::anonymous(), create_cmd("alice", f.org_id, vec![]))
            .await
            .unwrap();

        let mut again = create_cmd("alice", f.org_id, vec![]);
        again.phone_number = "0812999".to_string();
        again.employee_id = "emp-other".to_string();
        let err = f.service.create(&Caller::anonymous(), again).await.unwrap_err();
        assert_eq!(err, DomainError::already_exists("username"));
    }

    #[tokio::test]
    async fn create_in_unknown_organization_is_rejected() {
        let f = fixture().await;
        let err = f
            .service
            .create(&Caller::anonymous(), create_cmd("alice", OrgId::new(), vec![]))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("organization_id"));
    }

    #[tokio::test]
    async fn login_issues_claims_and_records_login() {
        let f = fixture().await;
        let admin = role("admin");
        f.roles.put(admin.clone());
        let id = f
            .service
            .create(&Caller::anonymous(), create_cmd("alice", f.org_id, vec![admin.id]))
            .await
            .unwrap();
        // Attach a resolved role the way the store's join query would.
        f.users.delete_user_roles_for_user(id).await.unwrap();
        f.users.assign_role(id, admin.clone());

        let token = f
            .service
            .login(LoginRequest { username: "alice".to_string(), password: "Sup3r-secret!".to_string() })
            .await
            .unwrap();

        let claims = f.tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.organization_id, f.org_id);
        assert_eq!(claims.roles.len(), 1);
        assert_eq!(claims.roles[0].name, "admin");

        assert!(f.users.get(id).unwrap().last_login_at.is_some());
    }

    #[tokio::test]
    async fn login_without_roles_is_rejected() {
        let f = fixture().await;
        f.service
            .create(&Caller::anonymous(), create_cmd("alice", f.org_id, vec![]))
            .await
            .unwrap();

        let err = f
            .service
            .login(LoginRequest { username: "alice".to_string(), password: "Sup3r-secret!".to_string() })
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("roles"));
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_rejected() {
        let f = fixture().await;
        f.service
            .create(&Caller::anonymous(), create_cmd("alice", f.org_id, vec![]))
            .await
            .unwrap();

        let err = f
            .service
            .login(LoginRequest { username: "alice".to_string(), password: "wrong".to_string() })
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::invalid("password", "invalid"));
    }

    #[tokio::test]
    async fn update_replaces_role_membership() {
        let f = fixture().await;
        let old_role = role("viewer");
        let new_role = role("editor");
        f.roles.put(old_role.clone());
        f.roles.put(new_role.clone());
        let id = f
            .service
            .create(&Caller::anonymous(), create_cmd("alice", f.org_id, vec![old_role.id]))
            .await
            .unwrap();
        assert_eq!(f.users.role_count(id), 1);

        let cmd = UpdateUser { role_ids: Some(vec![new_role.id]), ..Default::default() };
        f.service.update(&Caller::anonymous(), id, cmd).await.unwrap();

        let roles = f.users.user_roles_for_users(&[id]).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].role_id, new_role.id);
    }

    #[tokio::test]
    async fn update_keeps_untouched_fields() {
        let f = fixture().await;
        let id = f
            .service
            .create(&Caller::anonymous(), create_cmd("alice", f.org_id, vec![]))
            .await
            .unwrap();
        let before = f.users.get(id).unwrap();

        let cmd = UpdateUser {
            first_name: Patch::Value("Alicia".to_string()),
            ..Default::default()
        };
        f.service.update(&Caller::anonymous(), id, cmd).await.unwrap();

        let after = f.users.get(id).unwrap();
        assert_eq!(after.first_name, "Alicia");
        assert_eq!(after.username, before.username);
        assert_eq!(after.phone_number, before.phone_number);
        assert_eq!(after.password_hash, before.password_hash);
    }

    #[tokio::test]
    async fn change_password_requires_matching_old_password() {
        let f = fixture().await;
        let id = f
            .service
            .create(&Caller::anonymous(), create_cmd("alice", f.org_id, vec![]))
            .await
            .unwrap();

        let err = f
            .service
            .change_password(&Caller::anonymous(), id, "nope", "N3w-secret!")
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::invalid("old_password", "invalid"));

        f.service
            .change_password(&Caller::anonymous(), id, "Sup3r-secret!", "N3w-secret!")
            .await
            .unwrap();
        let stored = f.users.get(id).unwrap();
        assert!(verify_password("N3w-secret!", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn list_decorates_users_with_organization() {
        let f = fixture().await;
        f.service
            .create(&Caller::anonymous(), create_cmd("alice", f.org_id, vec![]))
            .await
            .unwrap();

        let page = f
            .service
            .list(&Caller::anonymous(), ListParams::default())
            .await
            .unwrap();
        assert_eq!(page.meta.total_items, 1);
        assert_eq!(page.items[0].organization.as_ref().unwrap().name, "HQ");
    }
}
