//! SQLx → domain error translation.
//!
//! Postgres error codes are mapped here so repositories never leak driver
//! errors upward: unique violations become conflicts, everything else an
//! internal error. "No rows" is not handled here at all — repositories use
//! `fetch_optional` and decide per call whether an empty result is a
//! not-found or a valid answer.

use thiserror::Error;

use gatehouse_core::DomainError;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint violation (Postgres 23505).
    #[error("duplicate key in {operation}: {message}")]
    Duplicate { operation: String, message: String },

    /// Foreign key violation (Postgres 23503).
    #[error("foreign key violation in {operation}: {message}")]
    ForeignKey { operation: String, message: String },

    #[error("database error in {operation}: {message}")]
    Database { operation: String, message: String },
}

impl StoreError {
    pub fn from_sqlx(operation: &str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some("23505") => Self::Duplicate { operation: operation.to_string(), message },
                    Some("23503") => Self::ForeignKey { operation: operation.to_string(), message },
                    _ => Self::Database { operation: operation.to_string(), message },
                }
            }
            sqlx::Error::PoolClosed => Self::Database {
                operation: operation.to_string(),
                message: "connection pool closed".to_string(),
            },
            other => Self::Database {
                operation: operation.to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { .. } => DomainError::conflict(err.to_string()),
            _ => DomainError::internal(err.to_string()),
        }
    }
}

/// Shorthand used by repository methods.
pub fn db_error(operation: &str, err: sqlx::Error) -> DomainError {
    StoreError::from_sqlx(operation, err).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_closed_maps_to_internal() {
        let err = db_error("insert_user", sqlx::Error::PoolClosed);
        assert!(matches!(err, DomainError::Internal(_)));
    }
}
