//! The authenticated identity threaded through every use-case call.
//!
//! A `Caller` is an explicit typed argument rather than a request-scoped
//! locals lookup, so use-cases never cast out of an untyped context bag.

use serde::Serialize;

use gatehouse_core::{OrgId, UserId};

use crate::claims::ClaimRole;

/// How the caller authenticated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerKind {
    /// JWT session on the authenticated surface.
    Session,
    /// Static API key on the external surface.
    External,
    /// No credential; public surface.
    Anonymous,
}

/// A resolved caller identity.
///
/// The external and public surfaces carry a synthetic caller so downstream
/// use-cases always receive the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub kind: CallerKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    pub username: String,
    pub roles: Vec<ClaimRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrgId>,
}

impl Caller {
    pub fn session(
        id: UserId,
        username: String,
        roles: Vec<ClaimRole>,
        organization_id: OrgId,
    ) -> Self {
        Self {
            kind: CallerKind::Session,
            id: Some(id),
            username,
            roles,
            organization_id: Some(organization_id),
        }
    }

    /// Synthetic identity for API-key callers.
    pub fn external() -> Self {
        Self {
            kind: CallerKind::External,
            id: None,
            username: "external".to_string(),
            roles: Vec::new(),
            organization_id: None,
        }
    }

    /// Synthetic identity for the unauthenticated public surface.
    pub fn anonymous() -> Self {
        Self {
            kind: CallerKind::Anonymous,
            id: None,
            username: "anonymous".to_string(),
            roles: Vec::new(),
            organization_id: None,
        }
    }

    /// The name recorded in audit stamps for actions by this caller.
    pub fn actor(&self) -> &str {
        &self.username
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_callers_have_no_user_identity() {
        assert_eq!(Caller::external().id, None);
        assert_eq!(Caller::anonymous().actor(), "anonymous");
    }
}
