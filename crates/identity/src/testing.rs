//! In-memory repository doubles for service tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gatehouse_core::{
    AuditStamps, DomainError, DomainResult, ListParams, OrgId, Patch, PermissionId, RoleId,
    RolePermissionId, SoftDelete, UserId, UserRoleId,
};

use crate::hierarchy;
use crate::model::membership::{RolePermission, UserRole};
use crate::model::organization::{Organization, OrganizationNode, OrganizationPatch};
use crate::model::permission::{Permission, PermissionPatch};
use crate::model::role::{Role, RolePatch};
use crate::model::user::{User, UserPatch};
use crate::repository::{
    OrganizationRepository, PermissionRepository, RoleRepository, UserRepository,
};

fn apply<T: Clone>(slot: &mut T, patch: &Patch<T>) {
    if let Patch::Value(v) = patch {
        *slot = v.clone();
    }
}

fn apply_opt<T: Clone>(slot: &mut Option<T>, patch: &Patch<T>) {
    match patch {
        Patch::Missing => {}
        Patch::Null => *slot = None,
        Patch::Value(v) => *slot = Some(v.clone()),
    }
}

pub fn stamps() -> AuditStamps {
    AuditStamps::new("test", Utc::now())
}

pub fn organization(name: &str, parent_id: Option<OrgId>) -> Organization {
    Organization {
        id: OrgId::new(),
        name: name.to_string(),
        code: name.to_ascii_lowercase(),
        address: None,
        latitude: None,
        longitude: None,
        kind: None,
        parent_id,
        path: None,
        level: 0,
        is_active: true,
        audit: stamps(),
        deleted: SoftDelete::default(),
    }
}

pub fn user(username: &str, organization_id: OrgId) -> User {
    User {
        id: UserId::new(),
        employee_id: format!("emp-{username}"),
        username: username.to_string(),
        email: None,
        first_name: username.to_string(),
        last_name: None,
        phone_number: format!("0812000{username}"),
        password_hash: String::new(),
        organization_id,
        is_active: true,
        last_login_at: None,
        avatar_gradient_start: None,
        avatar_gradient_end: None,
        audit: stamps(),
        deleted: SoftDelete::default(),
    }
}

pub fn role(name: &str) -> Role {
    Role {
        id: RoleId::new(),
        name: name.to_string(),
        description: None,
        is_system: false,
        audit: stamps(),
        deleted: SoftDelete::default(),
    }
}

pub fn permission(name: &str, action: Option<&str>, resource: Option<&str>) -> Permission {
    Permission {
        id: PermissionId::new(),
        name: name.to_string(),
        action: action.map(str::to_string),
        resource: resource.map(str::to_string),
        description: None,
        audit: stamps(),
        deleted: SoftDelete::default(),
    }
}

#[derive(Default)]
pub struct InMemoryOrganizations {
    rows: Mutex<HashMap<OrgId, Organization>>,
}

impl InMemoryOrganizations {
    pub fn put(&self, organization: Organization) {
        self.rows.lock().unwrap().insert(organization.id, organization);
    }

    pub fn get(&self, id: OrgId) -> Option<Organization> {
        self.rows.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryOrganizations {
    async fn create(&self, mut organization: Organization) -> DomainResult<OrgId> {
        let mut rows = self.rows.lock().unwrap();
        let parent_path = match organization.parent_id {
            Some(parent_id) => {
                let parent = rows
                    .get(&parent_id)
                    .filter(|o| !o.deleted.is_deleted())
                    .ok_or_else(|| DomainError::not_found("parent_id"))?;
                parent.path.clone()
            }
            None => None,
        };
        organization.assign_path(parent_path.as_deref());
        let id = organization.id;
        rows.insert(id, organization);
        Ok(id)
    }

    async fn find_tree(&self, id: OrgId) -> DomainResult<Option<OrganizationNode>> {
        let rows = self.rows.lock().unwrap();
        let Some(root) = rows.get(&id).filter(|o| !o.deleted.is_deleted()) else {
            return Ok(None);
        };
        let root_path = root.path.clone().unwrap_or_default();
        let prefix = format!("{root_path}.");
        let mut subtree: Vec<Organization> = rows
            .values()
            .filter(|o| !o.deleted.is_deleted())
            .filter(|o| {
                o.id == id
                    || o.path.as_deref().is_some_and(|p| p.starts_with(prefix.as_str()))
            })
            .cloned()
            .collect();
        subtree.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(hierarchy::build_tree(id, subtree))
    }

    async fn find_many(&self, ids: &[OrgId]) -> DomainResult<Vec<Organization>> {
        let rows = self.rows.lock().unwrap();
        Ok(ids.iter().filter_map(|id| rows.get(id)).cloned().collect())
    }

    async fn update(&self, patch: OrganizationPatch, actor: &str) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let org = rows
            .get_mut(&patch.id)
            .ok_or_else(|| DomainError::not_found("organization_id"))?;
        apply(&mut org.name, &patch.name);
        apply_opt(&mut org.address, &patch.address);
        apply_opt(&mut org.kind, &patch.kind);
        org.audit.touch(actor, Utc::now());
        Ok(())
    }

    async fn soft_delete(&self, id: OrgId, actor: &str) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let org = rows.get_mut(&id).ok_or_else(|| DomainError::not_found("organization_id"))?;
        org.deleted.deleted_at = Some(Utc::now());
        org.deleted.deleted_by = Some(actor.to_string());
        Ok(())
    }

    async fn list(&self, params: &ListParams) -> DomainResult<(Vec<Organization>, u64)> {
        let rows = self.rows.lock().unwrap();
        let mut all: Vec<Organization> = rows
            .values()
            .filter(|o| !o.deleted.is_deleted())
            .filter(|o| match &params.search {
                Some(s) => o.name.to_lowercase().contains(&s.to_lowercase()),
                None => true,
            })
            .cloned()
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        let total = all.len() as u64;
        let offset = params.page.offset() as usize;
        let items = all
            .into_iter()
            .skip(offset)
            .take(params.page.limit as usize)
            .collect();
        Ok((items, total))
    }
}

#[derive(Default)]
pub struct InMemoryUsers {
    rows: Mutex<HashMap<UserId, User>>,
    user_roles: Mutex<Vec<UserRole>>,
}

impl InMemoryUsers {
    pub fn put(&self, user: User) {
        self.rows.lock().unwrap().insert(user.id, user);
    }

    pub fn get(&self, id: UserId) -> Option<User> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn assign_role(&self, user_id: UserId, role: Role) {
        let mut row = UserRole::link(user_id, role.id, "test", Utc::now());
        row.role = Some(role);
        self.user_roles.lock().unwrap().push(row);
    }

    pub fn role_count(&self, user_id: UserId) -> usize {
        self.user_roles.lock().unwrap().iter().filter(|r| r.user_id == user_id).count()
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn insert(&self, user: User) -> DomainResult<UserId> {
        let id = user.id;
        self.rows.lock().unwrap().insert(id, user);
        Ok(id)
    }

    async fn find_by_id(&self, id: UserId) -> DomainResult<Option<User>> {
        Ok(self.rows.lock().unwrap().get(&id).filter(|u| !u.deleted.is_deleted()).cloned())
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username && !u.deleted.is_deleted())
            .cloned())
    }

    async fn find_by_phone_number(&self, phone_number: &str) -> DomainResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.phone_number == phone_number && !u.deleted.is_deleted())
            .cloned())
    }

    async fn find_by_employee_id(&self, employee_id: &str) -> DomainResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.employee_id == employee_id && !u.deleted.is_deleted())
            .cloned())
    }

    async fn update(&self, patch: UserPatch, actor: &str) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows.get_mut(&patch.id).ok_or_else(|| DomainError::not_found("user_id"))?;
        apply(&mut user.employee_id, &patch.employee_id);
        apply(&mut user.username, &patch.username);
        apply_opt(&mut user.email, &patch.email);
        apply(&mut user.first_name, &patch.first_name);
        apply_opt(&mut user.last_name, &patch.last_name);
        apply(&mut user.phone_number, &patch.phone_number);
        apply(&mut user.password_hash, &patch.password_hash);
        user.audit.touch(actor, Utc::now());
        Ok(())
    }

    async fn soft_delete(&self, id: UserId, actor: &str) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows.get_mut(&id).ok_or_else(|| DomainError::not_found("user_id"))?;
        user.deleted.deleted_at = Some(Utc::now());
        user.deleted.deleted_by = Some(actor.to_string());
        Ok(())
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> DomainResult<()> {
        if let Some(user) = self.rows.lock().unwrap().get_mut(&id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn list(&self, params: &ListParams) -> DomainResult<(Vec<User>, u64)> {
        let rows = self.rows.lock().unwrap();
        let mut all: Vec<User> = rows.values().filter(|u| !u.deleted.is_deleted()).cloned().collect();
        all.sort_by(|a, b| a.username.cmp(&b.username));
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(params.page.offset() as usize)
            .take(params.page.limit as usize)
            .collect();
        Ok((items, total))
    }

    async fn roles_for_user(&self, id: UserId) -> DomainResult<Vec<Role>> {
        Ok(self
            .user_roles
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == id)
            .filter_map(|r| r.role.clone())
            .filter(|r| !r.deleted.is_deleted())
            .collect())
    }

    async fn user_roles_for_users(&self, ids: &[UserId]) -> DomainResult<Vec<UserRole>> {
        Ok(self
            .user_roles
            .lock()
            .unwrap()
            .iter()
            .filter(|r| ids.contains(&r.user_id))
            .cloned()
            .collect())
    }

    async fn find_user_role(&self, id: UserRoleId) -> DomainResult<Option<UserRole>> {
        Ok(self.user_roles.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn insert_user_role(&self, row: UserRole) -> DomainResult<UserRoleId> {
        let id = row.id;
        self.user_roles.lock().unwrap().push(row);
        Ok(id)
    }

    async fn bulk_insert_user_roles(&self, rows: Vec<UserRole>) -> DomainResult<()> {
        self.user_roles.lock().unwrap().extend(rows);
        Ok(())
    }

    async fn delete_user_role(&self, id: UserRoleId) -> DomainResult<()> {
        self.user_roles.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }

    async fn delete_user_roles_for_user(&self, user_id: UserId) -> DomainResult<()> {
        self.user_roles.lock().unwrap().retain(|r| r.user_id != user_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRoles {
    rows: Mutex<HashMap<RoleId, Role>>,
    role_permissions: Mutex<Vec<RolePermission>>,
}

impl InMemoryRoles {
    pub fn put(&self, role: Role) {
        self.rows.lock().unwrap().insert(role.id, role);
    }

    pub fn permission_count(&self, role_id: RoleId) -> usize {
        self.role_permissions.lock().unwrap().iter().filter(|r| r.role_id == role_id).count()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoles {
    async fn insert(&self, role: Role) -> DomainResult<RoleId> {
        let id = role.id;
        self.rows.lock().unwrap().insert(id, role);
        Ok(id)
    }

    async fn find_by_id(&self, id: RoleId) -> DomainResult<Option<Role>> {
        Ok(self.rows.lock().unwrap().get(&id).filter(|r| !r.deleted.is_deleted()).cloned())
    }

    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Role>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|r| r.name.eq_ignore_ascii_case(name) && !r.deleted.is_deleted())
            .cloned())
    }

    async fn list(&self) -> DomainResult<Vec<Role>> {
        let mut all: Vec<Role> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| !r.deleted.is_deleted())
            .cloned()
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn update(&self, patch: RolePatch, actor: &str) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let role = rows.get_mut(&patch.id).ok_or_else(|| DomainError::not_found("role_id"))?;
        apply(&mut role.name, &patch.name);
        apply_opt(&mut role.description, &patch.description);
        role.audit.touch(actor, Utc::now());
        Ok(())
    }

    async fn soft_delete(&self, id: RoleId, actor: &str) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let role = rows.get_mut(&id).ok_or_else(|| DomainError::not_found("role_id"))?;
        role.deleted.deleted_at = Some(Utc::now());
        role.deleted.deleted_by = Some(actor.to_string());
        Ok(())
    }

    async fn find_role_permission(
        &self,
        id: RolePermissionId,
    ) -> DomainResult<Option<RolePermission>> {
        Ok(self.role_permissions.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn insert_role_permission(&self, row: RolePermission) -> DomainResult<RolePermissionId> {
        let id = row.id;
        self.role_permissions.lock().unwrap().push(row);
        Ok(id)
    }

    async fn bulk_insert_role_permissions(&self, rows: Vec<RolePermission>) -> DomainResult<()> {
        self.role_permissions.lock().unwrap().extend(rows);
        Ok(())
    }

    async fn delete_role_permission(&self, id: RolePermissionId) -> DomainResult<()> {
        self.role_permissions.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }

    async fn delete_role_permissions_for_role(&self, role_id: RoleId) -> DomainResult<()> {
        self.role_permissions.lock().unwrap().retain(|r| r.role_id != role_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPermissions {
    rows: Mutex<HashMap<PermissionId, Permission>>,
    grants: Mutex<Vec<(RoleId, PermissionId)>>,
}

impl InMemoryPermissions {
    pub fn put(&self, permission: Permission) {
        self.rows.lock().unwrap().insert(permission.id, permission);
    }

    pub fn grant(&self, role_id: RoleId, permission_id: PermissionId) {
        self.grants.lock().unwrap().push((role_id, permission_id));
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissions {
    async fn insert(&self, permission: Permission) -> DomainResult<PermissionId> {
        let id = permission.id;
        self.rows.lock().unwrap().insert(id, permission);
        Ok(id)
    }

    async fn find_by_id(&self, id: PermissionId) -> DomainResult<Option<Permission>> {
        Ok(self.rows.lock().unwrap().get(&id).filter(|p| !p.deleted.is_deleted()).cloned())
    }

    async fn find_same(
        &self,
        name: &str,
        action: &str,
        resource: &str,
    ) -> DomainResult<Option<Permission>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|p| {
                !p.deleted.is_deleted()
                    && p.name.eq_ignore_ascii_case(name)
                    && p.action.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(action))
                    && p.resource.as_deref().is_some_and(|r| r.eq_ignore_ascii_case(resource))
            })
            .cloned())
    }

    async fn find_same_excluding(
        &self,
        action: &str,
        resource: &str,
        exclude: PermissionId,
    ) -> DomainResult<Option<Permission>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|p| {
                !p.deleted.is_deleted()
                    && p.id != exclude
                    && p.action.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(action))
                    && p.resource.as_deref().is_some_and(|r| r.eq_ignore_ascii_case(resource))
            })
            .cloned())
    }

    async fn update(&self, patch: PermissionPatch, actor: &str) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let permission = rows
            .get_mut(&patch.id)
            .ok_or_else(|| DomainError::not_found("permission_id"))?;
        apply(&mut permission.name, &patch.name);
        apply_opt(&mut permission.action, &patch.action);
        apply_opt(&mut permission.resource, &patch.resource);
        apply_opt(&mut permission.description, &patch.description);
        permission.audit.touch(actor, Utc::now());
        Ok(())
    }

    async fn soft_delete(&self, id: PermissionId, actor: &str) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let permission =
            rows.get_mut(&id).ok_or_else(|| DomainError::not_found("permission_id"))?;
        permission.deleted.deleted_at = Some(Utc::now());
        permission.deleted.deleted_by = Some(actor.to_string());
        Ok(())
    }

    async fn list(&self, params: &ListParams) -> DomainResult<(Vec<Permission>, u64)> {
        let rows = self.rows.lock().unwrap();
        let mut all: Vec<Permission> =
            rows.values().filter(|p| !p.deleted.is_deleted()).cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(params.page.offset() as usize)
            .take(params.page.limit as usize)
            .collect();
        Ok((items, total))
    }

    async fn permissions_for_roles(&self, roles: &[RoleId]) -> DomainResult<Vec<Permission>> {
        let grants = self.grants.lock().unwrap();
        let rows = self.rows.lock().unwrap();
        let mut seen = std::collections::HashSet::new();
        let mut result = Vec::new();
        for (role_id, permission_id) in grants.iter() {
            if roles.contains(role_id) && seen.insert(*permission_id) {
                if let Some(p) = rows.get(permission_id).filter(|p| !p.deleted.is_deleted()) {
                    result.push(p.clone());
                }
            }
        }
        Ok(result)
    }
}
