//! Request DTOs and their validation into domain commands.
//!
//! Validation produces field→messages maps; update DTOs use [`Patch`] so an
//! omitted field, an explicit null and an empty string stay distinguishable
//! all the way to the store.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use gatehouse_core::error::FieldErrorBuilder;
use gatehouse_core::{
    DomainResult, ListParams, OrgId, PageRequest, Patch, PermissionId, RoleId, Sort, UserId,
};
use gatehouse_identity::model::organization::{CreateOrganization, OrganizationPatch};
use gatehouse_identity::model::permission::{CreatePermission, PermissionPatch};
use gatehouse_identity::model::role::{CreateRole, RolePatch};
use gatehouse_identity::model::user::CreateUser;
use gatehouse_identity::service::users::{LoginRequest, UpdateUser};

const MAX_TEXT_LEN: usize = 255;

// ---------------------------------------------------------------------------
// Shared validation helpers
// ---------------------------------------------------------------------------

fn require<'a>(
    b: &mut FieldErrorBuilder,
    field: &str,
    value: &'a Option<String>,
) -> Option<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            b.push(field, "is required");
            None
        }
    }
}

fn check_len(b: &mut FieldErrorBuilder, field: &str, value: &str, max: usize) {
    if value.len() > max {
        b.push(field, format!("must be at most {max} characters"));
    }
}

fn check_password_strength(b: &mut FieldErrorBuilder, field: &str, value: &str) {
    let strong = value.len() >= 8
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| !c.is_ascii_alphanumeric());
    if !strong {
        b.push(
            field,
            "must be at least 8 characters and mix upper case, lower case, digits and symbols",
        );
    }
}

fn check_phone(b: &mut FieldErrorBuilder, field: &str, value: &str) {
    let digits_only = value.chars().all(|c| c.is_ascii_digit());
    if !digits_only || !(11..=13).contains(&value.len()) {
        b.push(field, "must be 11 to 13 digits");
    }
}

fn check_coordinate(b: &mut FieldErrorBuilder, field: &str, value: &str, bound: f64) {
    match value.parse::<f64>() {
        Ok(v) if v.abs() <= bound => {}
        _ => b.push(field, format!("must be a coordinate between -{bound} and {bound}")),
    }
}

/// A present-but-null (or present-but-empty) value is invalid for fields
/// whose column is NOT NULL.
fn check_patch_not_emptied(b: &mut FieldErrorBuilder, field: &str, patch: &Patch<String>) {
    match patch {
        Patch::Null => b.push(field, "must not be null"),
        Patch::Value(v) if v.is_empty() => b.push(field, "must not be empty"),
        Patch::Value(v) => check_len(b, field, v, MAX_TEXT_LEN),
        _ => {}
    }
}

fn check_no_duplicates(b: &mut FieldErrorBuilder, field: &str, ids: &[Uuid]) {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    if ids.iter().any(|id| !seen.insert(*id)) {
        b.push(field, gatehouse_core::error::MSG_DUPLICATED);
    }
}

// ---------------------------------------------------------------------------
// Listing query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    /// `"<field> <asc|desc>"`; the field must be in the entity's allow-list.
    pub sort: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_until: Option<DateTime<Utc>>,
}

impl ListQuery {
    pub fn into_params(self, sortable: &[&str]) -> DomainResult<ListParams> {
        let sort = match self.sort.as_deref() {
            Some(raw) => Some(Sort::parse(raw, sortable)?),
            None => None,
        };
        Ok(ListParams {
            page: PageRequest::new(self.page.unwrap_or(1), self.limit.unwrap_or(10)),
            search: self.search.filter(|s| !s.is_empty()),
            sort,
            created_from: self.created_from,
            created_until: self.created_until,
        })
    }
}

// ---------------------------------------------------------------------------
// Organizations
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub parent_id: Option<Uuid>,
}

impl CreateOrganizationRequest {
    pub fn validate(self) -> DomainResult<CreateOrganization> {
        let mut b = FieldErrorBuilder::new();
        if let Some(name) = require(&mut b, "name", &self.name) {
            check_len(&mut b, "name", name, MAX_TEXT_LEN);
        }
        if let Some(address) = require(&mut b, "address", &self.address) {
            check_len(&mut b, "address", address, MAX_TEXT_LEN);
        }
        if let Some(latitude) = require(&mut b, "latitude", &self.latitude) {
            check_coordinate(&mut b, "latitude", latitude, 90.0);
        }
        if let Some(longitude) = require(&mut b, "longitude", &self.longitude) {
            check_coordinate(&mut b, "longitude", longitude, 180.0);
        }
        if let Some(kind) = require(&mut b, "type", &self.kind) {
            check_len(&mut b, "type", kind, MAX_TEXT_LEN);
        }
        b.finish()?;

        Ok(CreateOrganization {
            name: self.name.unwrap_or_default(),
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            kind: self.kind,
            parent_id: self.parent_id.map(OrgId::from_uuid),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrganizationRequest {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub address: Patch<String>,
    #[serde(default, rename = "type")]
    pub kind: Patch<String>,
}

impl UpdateOrganizationRequest {
    pub fn validate(self, id: OrgId) -> DomainResult<OrganizationPatch> {
        let mut b = FieldErrorBuilder::new();
        check_patch_not_emptied(&mut b, "name", &self.name);
        b.finish()?;

        Ok(OrganizationPatch { id, name: self.name, address: self.address, kind: self.kind })
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub employee_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub organization_id: Option<Uuid>,
    #[serde(default)]
    pub role_ids: Vec<Uuid>,
}

impl RegisterUserRequest {
    pub fn validate(self) -> DomainResult<CreateUser> {
        let mut b = FieldErrorBuilder::new();
        if let Some(employee_id) = require(&mut b, "employee_id", &self.employee_id) {
            check_len(&mut b, "employee_id", employee_id, 50);
        }
        if let Some(username) = require(&mut b, "username", &self.username) {
            check_len(&mut b, "username", username, MAX_TEXT_LEN);
        }
        if let Some(password) = require(&mut b, "password", &self.password) {
            check_password_strength(&mut b, "password", password);
        }
        if let Some(first_name) = require(&mut b, "first_name", &self.first_name) {
            check_len(&mut b, "first_name", first_name, MAX_TEXT_LEN);
        }
        if let Some(last_name) = self.last_name.as_deref() {
            check_len(&mut b, "last_name", last_name, MAX_TEXT_LEN);
        }
        if let Some(phone_number) = require(&mut b, "phone_number", &self.phone_number) {
            check_phone(&mut b, "phone_number", phone_number);
        }
        if self.organization_id.is_none() {
            b.push("organization_id", "is required");
        }
        if self.role_ids.is_empty() {
            b.push("role_ids", "is required");
        }
        check_no_duplicates(&mut b, "role_ids", &self.role_ids);
        b.finish()?;

        Ok(CreateUser {
            employee_id: self.employee_id.unwrap_or_default(),
            username: self.username.unwrap_or_default(),
            email: self.email.filter(|e| !e.is_empty()),
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.filter(|l| !l.is_empty()),
            phone_number: self.phone_number.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
            organization_id: OrgId::from_uuid(self.organization_id.unwrap_or_default()),
            role_ids: self.role_ids.into_iter().map(RoleId::from_uuid).collect(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub employee_id: Patch<String>,
    #[serde(default)]
    pub username: Patch<String>,
    #[serde(default)]
    pub email: Patch<String>,
    #[serde(default)]
    pub first_name: Patch<String>,
    #[serde(default)]
    pub last_name: Patch<String>,
    #[serde(default)]
    pub phone_number: Patch<String>,
    #[serde(default)]
    pub password: Patch<String>,
    /// Present list fully replaces the user's role membership.
    pub role_ids: Option<Vec<Uuid>>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> DomainResult<UpdateUser> {
        let mut b = FieldErrorBuilder::new();
        check_patch_not_emptied(&mut b, "employee_id", &self.employee_id);
        check_patch_not_emptied(&mut b, "username", &self.username);
        check_patch_not_emptied(&mut b, "first_name", &self.first_name);
        if let Patch::Value(phone_number) = &self.phone_number {
            check_phone(&mut b, "phone_number", phone_number);
        }
        if let Patch::Value(password) = &self.password {
            check_password_strength(&mut b, "password", password);
        }
        if let Some(role_ids) = &self.role_ids {
            check_no_duplicates(&mut b, "role_ids", role_ids);
        }
        b.finish()?;

        Ok(UpdateUser {
            employee_id: self.employee_id,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            phone_number: self.phone_number,
            password: self.password,
            role_ids: self
                .role_ids
                .map(|ids| ids.into_iter().map(RoleId::from_uuid).collect()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequestBody {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginRequestBody {
    pub fn validate(self) -> DomainResult<LoginRequest> {
        let mut b = FieldErrorBuilder::new();
        require(&mut b, "username", &self.username);
        require(&mut b, "password", &self.password);
        b.finish()?;

        Ok(LoginRequest {
            username: self.username.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

impl ChangePasswordRequest {
    pub fn validate(self) -> DomainResult<(String, String)> {
        let mut b = FieldErrorBuilder::new();
        require(&mut b, "old_password", &self.old_password);
        if let Some(new_password) = require(&mut b, "new_password", &self.new_password) {
            check_password_strength(&mut b, "new_password", new_password);
        }
        b.finish()?;

        Ok((self.old_password.unwrap_or_default(), self.new_password.unwrap_or_default()))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRoleRequest {
    pub user_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
}

impl CreateUserRoleRequest {
    pub fn validate(self) -> DomainResult<gatehouse_identity::model::membership::CreateUserRole> {
        let mut b = FieldErrorBuilder::new();
        if self.user_id.is_none() {
            b.push("user_id", "is required");
        }
        if self.role_id.is_none() {
            b.push("role_id", "is required");
        }
        b.finish()?;

        Ok(gatehouse_identity::model::membership::CreateUserRole {
            user_id: UserId::from_uuid(self.user_id.unwrap_or_default()),
            role_id: RoleId::from_uuid(self.role_id.unwrap_or_default()),
        })
    }
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CreateRoleRequest {
    pub fn validate(self) -> DomainResult<CreateRole> {
        let mut b = FieldErrorBuilder::new();
        if let Some(name) = require(&mut b, "name", &self.name) {
            check_len(&mut b, "name", name, MAX_TEXT_LEN);
        }
        b.finish()?;

        Ok(CreateRole {
            name: self.name.unwrap_or_default(),
            description: self.description.filter(|d| !d.is_empty()),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    /// Present list fully replaces the role's permission grants.
    pub permission_ids: Option<Vec<Uuid>>,
}

impl UpdateRoleRequest {
    pub fn validate(self, id: RoleId) -> DomainResult<(RolePatch, Option<Vec<PermissionId>>)> {
        let mut b = FieldErrorBuilder::new();
        check_patch_not_emptied(&mut b, "name", &self.name);
        if let Some(permission_ids) = &self.permission_ids {
            check_no_duplicates(&mut b, "permission_ids", permission_ids);
        }
        b.finish()?;

        Ok((
            RolePatch { id, name: self.name, description: self.description },
            self.permission_ids
                .map(|ids| ids.into_iter().map(PermissionId::from_uuid).collect()),
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRolePermissionRequest {
    pub role_id: Option<Uuid>,
    pub permission_id: Option<Uuid>,
}

impl CreateRolePermissionRequest {
    pub fn validate(
        self,
    ) -> DomainResult<gatehouse_identity::model::membership::CreateRolePermission> {
        let mut b = FieldErrorBuilder::new();
        if self.role_id.is_none() {
            b.push("role_id", "is required");
        }
        if self.permission_id.is_none() {
            b.push("permission_id", "is required");
        }
        b.finish()?;

        Ok(gatehouse_identity::model::membership::CreateRolePermission {
            role_id: RoleId::from_uuid(self.role_id.unwrap_or_default()),
            permission_id: PermissionId::from_uuid(self.permission_id.unwrap_or_default()),
        })
    }
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreatePermissionRequest {
    pub name: Option<String>,
    pub action: Option<String>,
    pub resource: Option<String>,
    pub description: Option<String>,
}

impl CreatePermissionRequest {
    pub fn validate(self) -> DomainResult<CreatePermission> {
        let mut b = FieldErrorBuilder::new();
        if let Some(name) = require(&mut b, "name", &self.name) {
            check_len(&mut b, "name", name, MAX_TEXT_LEN);
        }
        if let Some(action) = require(&mut b, "action", &self.action) {
            check_len(&mut b, "action", action, MAX_TEXT_LEN);
        }
        if let Some(resource) = require(&mut b, "resource", &self.resource) {
            check_len(&mut b, "resource", resource, MAX_TEXT_LEN);
        }
        b.finish()?;

        Ok(CreatePermission {
            name: self.name.unwrap_or_default(),
            action: self.action.unwrap_or_default(),
            resource: self.resource.unwrap_or_default(),
            description: self.description.filter(|d| !d.is_empty()),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePermissionRequest {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub action: Patch<String>,
    #[serde(default)]
    pub resource: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
}

impl UpdatePermissionRequest {
    pub fn validate(self, id: PermissionId) -> DomainResult<PermissionPatch> {
        let mut b = FieldErrorBuilder::new();
        check_patch_not_emptied(&mut b, "name", &self.name);
        b.finish()?;

        Ok(PermissionPatch {
            id,
            name: self.name,
            action: self.action,
            resource: self.resource,
            description: self.description,
        })
    }
}
