//! Transaction coordinator.
//!
//! `atomic` is the single all-or-nothing boundary in the system: it begins
//! a transaction, hands the unit of work a transaction-scoped handle, and
//! commits only when the work returns `Ok`. A returned error — or a panic
//! caught mid-work — rolls back and comes out as an error, so a
//! programming fault inside a unit of work degrades to a reported failure
//! instead of crashing the process. Nested calls are not supported;
//! callers already holding a transaction must not re-enter.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use futures::future::BoxFuture;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::error;

use gatehouse_core::{DomainError, DomainResult};

use crate::error::db_error;

#[derive(Clone)]
pub struct TxManager {
    pool: PgPool,
}

impl TxManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run `work` inside a transaction.
    pub async fn atomic<T, F>(&self, work: F) -> DomainResult<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut Transaction<'static, Postgres>) -> BoxFuture<'t, DomainResult<T>>
            + Send,
    {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin_transaction", e))?;

        let outcome = AssertUnwindSafe(work(&mut tx)).catch_unwind().await;

        match outcome {
            Ok(Ok(value)) => {
                tx.commit().await.map_err(|e| db_error("commit_transaction", e))?;
                Ok(value)
            }
            Ok(Err(err)) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(error = %rollback_err, "rollback after failed unit of work also failed");
                }
                Err(err)
            }
            Err(panic) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(error = %rollback_err, "rollback after panic also failed");
                }
                let message = panic_message(panic);
                error!(panic = %message, "panic recovered inside transactional unit of work");
                Err(DomainError::internal(format!(
                    "panic in transactional unit of work: {message}"
                )))
            }
        }
    }
}

/// Best-effort extraction of a panic payload message.
fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
