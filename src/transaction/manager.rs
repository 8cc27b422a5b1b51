// ============================================================================
// Transaction Manager
// ============================================================================

use super::{Transaction, TransactionId};
use crate::core::Result;
use crate::storage::InMemoryStorage;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Level, event};

pub struct TransactionManager {
    storage: Arc<InMemoryStorage>,
    committed: AtomicU64,
    aborted: AtomicU64,
}

/// Counters since the manager was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionStats {
    pub committed: u64,
    pub aborted: u64,
}

impl TransactionManager {
    pub fn new(storage: Arc<InMemoryStorage>) -> Self {
        Self {
            storage,
            committed: AtomicU64::new(0),
            aborted: AtomicU64::new(0),
        }
    }

    pub async fn begin(&self) -> Transaction {
        let snapshot = self.storage.snapshot().await;
        let txn = Transaction::new(TransactionId::new(), snapshot);
        event!(Level::TRACE, txn = %txn.id(), "transaction begin");
        txn
    }

    /// Publishes the transaction's writes. On conflict nothing is applied and
    /// the transaction ends up aborted.
    pub async fn commit(&self, txn: &mut Transaction) -> Result<()> {
        txn.ensure_active("commit")?;

        if !txn.written().is_empty()
            && let Err(err) = self
                .storage
                .apply(txn.base(), txn.tables(), txn.written())
                .await
        {
            txn.mark_aborted()?;
            self.aborted.fetch_add(1, Ordering::Relaxed);
            event!(Level::DEBUG, txn = %txn.id(), error = %err, "transaction commit failed");
            return Err(err);
        }

        txn.mark_committed()?;
        self.committed.fetch_add(1, Ordering::Relaxed);
        event!(
            Level::DEBUG,
            txn = %txn.id(),
            changes = txn.change_count(),
            "transaction committed"
        );
        Ok(())
    }

    pub fn rollback(&self, txn: &mut Transaction) -> Result<()> {
        txn.mark_aborted()?;
        self.aborted.fetch_add(1, Ordering::Relaxed);
        event!(
            Level::DEBUG,
            txn = %txn.id(),
            discarded = txn.change_count(),
            "transaction rolled back"
        );
        Ok(())
    }

    pub fn stats(&self) -> TransactionStats {
        TransactionStats {
            committed: self.committed.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
        }
    }
}
