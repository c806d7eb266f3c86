//! Role entity.

use serde::{Deserialize, Serialize};

use gatehouse_core::{AuditStamps, Identified, Patch, RoleId, SoftDelete};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    /// Unique case-insensitively among non-deleted roles.
    pub name: String,
    pub description: Option<String>,
    /// System roles are seeded by operators and not user-editable.
    pub is_system: bool,
    #[serde(flatten)]
    pub audit: AuditStamps,
    #[serde(flatten)]
    pub deleted: SoftDelete,
}

impl Identified for Role {
    type Id = RoleId;

    fn id(&self) -> RoleId {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub description: Option<String>,
}

/// Partial update; only present fields overwrite stored values.
#[derive(Debug, Clone, Default)]
pub struct RolePatch {
    pub id: RoleId,
    pub name: Patch<String>,
    pub description: Patch<String>,
}
