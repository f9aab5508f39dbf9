//! Transactions over the embedded store
//!
//! A transaction takes a snapshot of the committed rows when it begins. Committing
//! flushes queued writes and keeps them; rolling back discards queued writes and puts
//! the snapshot back. Nested transactions work like savepoints: each one snapshots the
//! state its parent had reached.
//!
//! Identifiers handed out inside a transaction are never reused after a rollback.
//!
//! # Examples
//!
//! ```
//! use cattery::entity::Cat;
//! use cattery::EntityManager;
//!
//! # fn main() -> Result<(), cattery::CatteryError> {
//! let em = EntityManager::in_memory();
//! em.persist(Cat::new("Mugi", 3))?;
//!
//! let mut tx = em.begin()?;
//! em.persist(Cat::new("Sora", 7))?;
//!
//! let nested = tx.begin_nested()?;
//! em.persist(Cat::new("Leo", 1))?;
//! nested.rollback()?;
//!
//! tx.commit()?;
//! assert_eq!(em.count::<Cat>()?, 2);
//! # Ok(())
//! # }
//! ```

use crate::error::{CatteryError, TransactionError};
use crate::store::EntityManager;
use crate::tracing_helpers;

impl EntityManager {
    /// Flush queued writes and start a transaction
    pub fn begin(&self) -> Result<Transaction, CatteryError> {
        Transaction::new(self.clone())
    }
}

/// An open transaction.
///
/// Dropping a transaction that was neither committed nor rolled back rolls it back,
/// together with any nested transaction still open inside it.
#[derive(Debug)]
pub struct Transaction {
    em: EntityManager,
    depth: usize,
    closed: bool,
}

impl Transaction {
    fn new(em: EntityManager) -> Result<Self, CatteryError> {
        let depth = em.push_snapshot()?;
        let _span = tracing_helpers::begin_transaction_span(depth).entered();
        tracing::debug!("transaction started");
        Ok(Self {
            em,
            depth,
            closed: false,
        })
    }

    /// Start a nested transaction (savepoint).
    ///
    /// Only the innermost open transaction may start a nested one.
    pub fn begin_nested(&mut self) -> Result<Transaction, CatteryError> {
        if self.closed {
            return Err(TransactionError::TransactionClosed.into());
        }
        let open = self.em.transaction_depth();
        if open < self.depth {
            return Err(TransactionError::TransactionClosed.into());
        }
        if open > self.depth {
            return Err(TransactionError::NestedTransactionError(format!(
                "transaction at depth {} already has an open nested transaction",
                self.depth
            ))
            .into());
        }
        Transaction::new(self.em.clone())
    }

    /// Commit the transaction.
    ///
    /// Queued writes are flushed. If the flush fails, or an inner transaction is still
    /// open, the error is returned and the transaction is rolled back.
    pub fn commit(mut self) -> Result<(), CatteryError> {
        if self.closed {
            return Err(TransactionError::TransactionClosed.into());
        }
        let _span = tracing_helpers::commit_transaction_span(self.depth).entered();
        self.em.release_snapshot(self.depth)?;
        self.closed = true;
        Ok(())
    }

    /// Roll the transaction back, discarding queued writes and restoring the rows it
    /// started with.
    pub fn rollback(mut self) -> Result<(), CatteryError> {
        if self.closed {
            return Err(TransactionError::TransactionClosed.into());
        }
        let _span = tracing_helpers::rollback_transaction_span(self.depth).entered();
        self.em.restore_snapshot(self.depth)?;
        self.closed = true;
        Ok(())
    }

    pub fn entity_manager(&self) -> &EntityManager {
        &self.em
    }

    /// Nesting depth, 1 for an outermost transaction
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.closed {
            let _span = tracing_helpers::rollback_transaction_span(self.depth).entered();
            tracing::debug!("open transaction dropped, rolling back");
            self.em.abandon_snapshot(self.depth);
            self.closed = true;
        }
    }
}
