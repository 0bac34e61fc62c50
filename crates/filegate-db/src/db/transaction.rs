//! Database transaction utilities
//!
//! Multi-statement operations that must see a consistent view (tenant removal
//! checks its dependents and deletes in one unit) go through [`TransactionGuard`].

use filegate_core::AppError;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

/// A transaction that must be finished with [`commit`](Self::commit) or
/// [`rollback`](Self::rollback). Dropping an unfinished guard rolls back.
pub struct TransactionGuard<'a> {
    transaction: Option<Transaction<'a, Postgres>>,
}

impl<'a> TransactionGuard<'a> {
    pub async fn begin(pool: &'a PgPool) -> Result<Self, AppError> {
        let transaction = pool.begin().await?;
        Ok(Self {
            transaction: Some(transaction),
        })
    }

    /// Connection to run statements on while the transaction is open
    pub fn conn(&mut self) -> Result<&mut PgConnection, AppError> {
        self.transaction
            .as_mut()
            .map(|tx| &mut **tx)
            .ok_or_else(|| AppError::Internal("Transaction already finished".to_string()))
    }

    pub async fn commit(mut self) -> Result<(), AppError> {
        if let Some(tx) = self.transaction.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<(), AppError> {
        if let Some(tx) = self.transaction.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.transaction.is_some() {
            tracing::warn!("Transaction dropped without commit or rollback - rolling back");
        }
    }
}
