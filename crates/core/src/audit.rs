//! Audit stamps shared by all persisted entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creation/update bookkeeping carried by every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamps {
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

impl AuditStamps {
    pub fn new(actor: &str, now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            created_by: actor.to_string(),
            updated_at: now,
            updated_by: actor.to_string(),
        }
    }

    pub fn touch(&mut self, actor: &str, now: DateTime<Utc>) {
        self.updated_at = now;
        self.updated_by = actor.to_string();
    }
}

/// Soft-delete marker. A row with `deleted_at` set is excluded from normal
/// queries but never physically removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftDelete {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
}

impl SoftDelete {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
