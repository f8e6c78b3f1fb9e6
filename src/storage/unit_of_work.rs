//! Unit of Work
//!
//! Atomic commit/rollback boundary around a sequence of store operations.
//!
//! `run` opens an IMMEDIATE transaction: SQLite hands out the writer lock at
//! BEGIN, so every row read inside the closure is effectively locked for
//! update until COMMIT. Concurrent writers block for at most the configured
//! busy timeout and then fail with a retryable `Conflict`.
//!
//! Each public manager method calls `run` (or `read`) at most once; the
//! closure receives the transaction and must not open another unit of work.

use rusqlite::{Transaction, TransactionBehavior};

use crate::storage::database::Database;
use crate::utils::error::AppResult;

/// Transaction boundary shared by every manager
#[derive(Debug, Clone)]
pub struct UnitOfWork {
    db: Database,
}

impl UnitOfWork {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Underlying database handle
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Run `f` inside a write transaction.
    ///
    /// Commits when `f` returns `Ok`; rolls back and returns the error
    /// otherwise, including business-rule errors raised by `f`.
    pub fn run<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> AppResult<T>,
    {
        self.execute(TransactionBehavior::Immediate, f)
    }

    /// Run `f` inside a read (deferred) transaction so multi-statement reads
    /// observe one consistent snapshot.
    pub fn read<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> AppResult<T>,
    {
        self.execute(TransactionBehavior::Deferred, f)
    }

    fn execute<T, F>(&self, behavior: TransactionBehavior, f: F) -> AppResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> AppResult<T>,
    {
        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction_with_behavior(behavior)?;

        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::warn!("[UnitOfWork] rollback failed: {}", rollback_err);
                }
                tracing::debug!("[UnitOfWork] rolled back: {}", err);
                Err(err)
            }
        }
    }
}
