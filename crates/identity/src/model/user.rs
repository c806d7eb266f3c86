//! User account entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatehouse_auth::Scope;
use gatehouse_core::{AuditStamps, Identified, OrgId, Patch, RoleId, SoftDelete, UserId};

use crate::model::organization::OrganizationNode;
use crate::model::permission::Permission;
use crate::model::role::Role;

pub const SORTABLE_FIELDS: &[&str] = &["username", "employee_id", "first_name", "created_at"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub employee_id: String,
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone_number: String,
    /// Opaque PHC hash; write-only, never serialized outward.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub organization_id: OrgId,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub avatar_gradient_start: Option<String>,
    pub avatar_gradient_end: Option<String>,
    #[serde(flatten)]
    pub audit: AuditStamps,
    #[serde(flatten)]
    pub deleted: SoftDelete,
}

impl User {
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

impl Identified for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Validated input for creating a user; the password is still plaintext
/// here and is hashed by the use-case.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub employee_id: String,
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone_number: String,
    pub password: String,
    pub organization_id: OrgId,
    pub role_ids: Vec<RoleId>,
}

/// Partial update; only present fields overwrite stored values.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub id: UserId,
    pub employee_id: Patch<String>,
    pub username: Patch<String>,
    pub email: Patch<String>,
    pub first_name: Patch<String>,
    pub last_name: Patch<String>,
    pub phone_number: Patch<String>,
    /// Already-hashed replacement password.
    pub password_hash: Patch<String>,
}

/// A user in a listing, decorated with query-time relations.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationSummary>,
}

/// The slice of an organization shown alongside a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationSummary {
    pub id: OrgId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Full "show user" view: the user plus resolved authorization state and
/// the organization subtree it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
    pub scopes: Vec<Scope>,
    pub organization: OrganizationNode,
}
