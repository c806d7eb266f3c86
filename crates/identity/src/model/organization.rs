//! Organization tree node.
//!
//! Organizations form a hierarchy stored as a materialized path: a
//! dot-delimited chain of ancestor ids ending in the node's own id. The
//! path is computed once at creation (nodes are never re-parented) and is
//! what makes one-query subtree retrieval possible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatehouse_core::{AuditStamps, Identified, OrgId, Patch, SoftDelete};

use crate::hierarchy;

/// Fields a listing may sort by.
pub const SORTABLE_FIELDS: &[&str] = &["name", "code", "type", "created_at"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
    /// URL-safe slug derived from the name at creation.
    pub code: String,
    pub address: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub parent_id: Option<OrgId>,
    /// Materialized ancestor chain: `root.child...self`. Set at creation,
    /// never independently mutated afterwards.
    pub path: Option<String>,
    /// Depth in the tree; informational only.
    pub level: i32,
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: AuditStamps,
    #[serde(flatten)]
    pub deleted: SoftDelete,
}

impl Organization {
    /// Build a new node from a create command. The path is assigned later,
    /// inside the same transaction that reads the parent's current path.
    pub fn build(cmd: CreateOrganization, actor: &str, now: DateTime<Utc>) -> Self {
        let code = slug(&cmd.name);
        Self {
            id: OrgId::new(),
            name: cmd.name,
            code,
            address: cmd.address,
            latitude: cmd.latitude,
            longitude: cmd.longitude,
            kind: cmd.kind,
            parent_id: cmd.parent_id,
            path: None,
            level: 0,
            is_active: true,
            audit: AuditStamps::new(actor, now),
            deleted: SoftDelete::default(),
        }
    }

    /// Establish the materialized path from the parent's current path
    /// (`None` for a root node).
    pub fn assign_path(&mut self, parent_path: Option<&str>) {
        let path = hierarchy::compute_path(self.id, parent_path);
        self.level = path.matches('.').count() as i32;
        self.path = Some(path);
    }
}

impl Identified for Organization {
    type Id = OrgId;

    fn id(&self) -> OrgId {
        self.id
    }
}

/// A node of a reconstructed subtree, owning its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationNode {
    #[serde(flatten)]
    pub organization: Organization,
    pub children: Vec<OrganizationNode>,
}

impl OrganizationNode {
    pub fn leaf(organization: Organization) -> Self {
        Self { organization, children: Vec::new() }
    }

    /// Whether the subtree rooted here contains the given id.
    pub fn contains(&self, id: OrgId) -> bool {
        self.organization.id == id || self.children.iter().any(|c| c.contains(id))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub parent_id: Option<OrgId>,
}

/// Partial update; only present fields overwrite stored values.
#[derive(Debug, Clone, Default)]
pub struct OrganizationPatch {
    pub id: OrgId,
    pub name: Patch<String>,
    pub address: Patch<String>,
    pub kind: Patch<String>,
}

/// Derive the `code` slug from a display name.
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
