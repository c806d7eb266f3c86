use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use gatehouse_core::{OrgId, RoleId, UserId};

use crate::token::SESSION_TTL_HOURS;

/// Role as embedded in a session token: id + display name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRole {
    pub id: RoleId,
    pub name: String,
}

/// Claims embedded in every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject — the authenticated user.
    pub sub: UserId,
    pub username: String,
    pub roles: Vec<ClaimRole>,
    pub organization_id: OrgId,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp), fixed at 24 hours after issuance.
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(
        sub: UserId,
        username: String,
        roles: Vec<ClaimRole>,
        organization_id: OrgId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            sub,
            username,
            roles,
            organization_id,
            iat: now.timestamp(),
            exp: (now + Duration::hours(SESSION_TTL_HOURS)).timestamp(),
        }
    }
}
