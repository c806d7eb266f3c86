//! Domain error model.
//!
//! Use-cases return taxonomy-tagged errors; where a failure is tied to
//! specific request fields the error carries a field→messages map which the
//! transport layer serializes verbatim.

use std::collections::BTreeMap;

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Field-level error messages, keyed by the request field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Message used when a referenced entity does not exist.
pub const MSG_NOT_FOUND: &str = "not found";
/// Message used when a natural key is already taken.
pub const MSG_ALREADY_EXIST: &str = "already exist";
/// Message used when a request repeats a value that must be unique.
pub const MSG_DUPLICATED: &str = "duplicated";

/// Domain-level error taxonomy.
///
/// Keep this focused on deterministic business failures; infrastructure
/// faults surface as `Internal`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A referenced entity does not exist (or is soft-deleted).
    #[error("not found")]
    NotFound(FieldErrors),

    /// A natural key or unique tuple is already taken.
    #[error("already exists")]
    AlreadyExists(FieldErrors),

    /// One or more request fields failed validation.
    #[error("validation failed")]
    Validation(FieldErrors),

    /// The caller presented no valid credential.
    #[error("unauthorized")]
    Unauthorized,

    /// The caller is authenticated but not allowed to do this.
    #[error("forbidden")]
    Forbidden,

    /// The request conflicts with current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An unexpected infrastructure or programming fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Not-found tied to a single request field.
    pub fn not_found(field: impl Into<String>) -> Self {
        Self::NotFound(field_map(field, MSG_NOT_FOUND))
    }

    /// Already-exists tied to a single request field.
    pub fn already_exists(field: impl Into<String>) -> Self {
        Self::AlreadyExists(field_map(field, MSG_ALREADY_EXIST))
    }

    /// Validation failure with a single field message.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(field_map(field, message))
    }

    pub fn validation(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The field→messages map carried by this error, if any.
    pub fn fields(&self) -> Option<&FieldErrors> {
        match self {
            Self::NotFound(f) | Self::AlreadyExists(f) | Self::Validation(f) => Some(f),
            _ => None,
        }
    }
}

fn field_map(field: impl Into<String>, message: impl Into<String>) -> FieldErrors {
    let mut map = FieldErrors::new();
    map.insert(field.into(), vec![message.into()]);
    map
}

/// Accumulates field-level validation messages before turning them into a
/// [`DomainError::Validation`].
#[derive(Debug, Default, Clone)]
pub struct FieldErrorBuilder {
    errors: FieldErrors,
}

impl FieldErrorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when no messages were collected, the validation error otherwise.
    pub fn finish(self) -> DomainResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_field_helpers_build_maps() {
        let err = DomainError::already_exists("username");
        let fields = err.fields().unwrap();
        assert_eq!(fields["username"], vec![MSG_ALREADY_EXIST.to_string()]);
    }

    #[test]
    fn builder_collects_multiple_messages_per_field() {
        let mut b = FieldErrorBuilder::new();
        b.push("password", "is required");
        b.push("password", "too short");
        let err = b.finish().unwrap_err();
        assert_eq!(err.fields().unwrap()["password"].len(), 2);
    }

    #[test]
    fn empty_builder_is_ok() {
        assert!(FieldErrorBuilder::new().finish().is_ok());
    }
}
