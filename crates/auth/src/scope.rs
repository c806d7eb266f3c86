use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// An effective permission scope, formatted as `resource:action`
/// (e.g. `user:read`).
///
/// Scopes are opaque strings at this layer; they are derived from
/// role→permission resolution and consumed by session claims and
/// downstream authorization checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(Cow<'static, str>);

impl Scope {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Build a scope from its two halves. Both must be non-empty; a
    /// permission missing either half has no scope representation.
    pub fn from_parts(resource: &str, action: &str) -> Option<Self> {
        if resource.is_empty() || action.is_empty() {
            return None;
        }
        Some(Self(Cow::Owned(format!("{resource}:{action}"))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_formats_resource_then_action() {
        assert_eq!(Scope::from_parts("user", "read").unwrap().as_str(), "user:read");
    }

    #[test]
    fn half_empty_pairs_have_no_scope() {
        assert!(Scope::from_parts("", "read").is_none());
        assert!(Scope::from_parts("user", "").is_none());
    }
}
