//! Permission entity.

use serde::{Deserialize, Serialize};

use gatehouse_core::{AuditStamps, Identified, Patch, PermissionId, SoftDelete};

pub const SORTABLE_FIELDS: &[&str] = &["name", "action", "resource", "created_at"];

/// A grantable capability: an `action` (create, read, update, delete,
/// approve, ...) over a `resource` (domain noun).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    pub action: Option<String>,
    pub resource: Option<String>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub audit: AuditStamps,
    #[serde(flatten)]
    pub deleted: SoftDelete,
}

impl Identified for Permission {
    type Id = PermissionId;

    fn id(&self) -> PermissionId {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePermission {
    pub name: String,
    pub action: String,
    pub resource: String,
    pub description: Option<String>,
}

/// Partial update; only present fields overwrite stored values.
#[derive(Debug, Clone, Default)]
pub struct PermissionPatch {
    pub id: PermissionId,
    pub name: Patch<String>,
    pub action: Patch<String>,
    pub resource: Patch<String>,
    pub description: Patch<String>,
}
