// ============================================================================
// Transaction State Management
// ============================================================================
//
// A transaction moves through Active -> Committed/Aborted.
//
// Each transaction owns a copy-on-write snapshot of the committed tables:
// - reads see the snapshot plus the transaction's own writes
// - writes are invisible to everybody else until commit
// - rollback discards the working copy
//
// ============================================================================

use super::Change;
use crate::core::{DbError, Result, Row, RowId};
use crate::storage::{StorageEngine, TableSet};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global transaction ID counter
static NEXT_TXN_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Generate a new unique transaction ID
    pub fn new() -> Self {
        TransactionId(NEXT_TXN_ID.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn_{}", self.0)
    }
}

/// Transaction state
///
/// ```text
/// Active ──commit──> Committed
///   │
///   └──rollback──> Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    Aborted,
}

impl TransactionState {
    pub fn is_active(&self) -> bool {
        matches!(self, TransactionState::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionState::Committed | TransactionState::Aborted
        )
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionState::Active => write!(f, "ACTIVE"),
            TransactionState::Committed => write!(f, "COMMITTED"),
            TransactionState::Aborted => write!(f, "ABORTED"),
        }
    }
}

/// A storage-level transaction over a snapshot of the committed tables.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    state: TransactionState,

    /// Committed state when the transaction began, kept for conflict checks
    base: TableSet,

    /// Snapshot plus this transaction's writes
    working: TableSet,

    /// Rows written so far, per table
    written: BTreeMap<String, BTreeSet<RowId>>,

    changes: Vec<Change>,
}

impl Transaction {
    pub fn new(id: TransactionId, snapshot: TableSet) -> Self {
        Self {
            id,
            state: TransactionState::Active,
            working: snapshot.clone(),
            base: snapshot,
            written: BTreeMap::new(),
            changes: Vec::new(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Tables as seen by this transaction
    pub fn tables(&self) -> &TableSet {
        &self.working
    }

    pub(crate) fn base(&self) -> &TableSet {
        &self.base
    }

    pub(crate) fn written(&self) -> &BTreeMap<String, BTreeSet<RowId>> {
        &self.written
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    pub fn insert(&mut self, table: &str, row: Row) -> Result<RowId> {
        self.ensure_active("insert")?;

        let id = self.working.table_mut(table)?.insert(row)?;
        let stored = self.working.table(table)?.get(id).cloned().unwrap_or_default();

        self.mark_written(table, id);
        self.changes.push(Change::InsertRow {
            table: table.to_string(),
            id,
            row: stored,
        });
        Ok(id)
    }

    /// Overwrites `changes` on row `id`. Returns `false` when the row doesn't exist.
    pub fn update(&mut self, table: &str, id: RowId, changes: Row) -> Result<bool> {
        self.ensure_active("update")?;

        let target = self.working.table_mut(table)?;
        let Some(old_row) = target.get(id).cloned() else {
            return Ok(false);
        };
        target.update(id, &changes)?;

        self.mark_written(table, id);
        self.changes.push(Change::UpdateRow {
            table: table.to_string(),
            id,
            old_row,
            changes,
        });
        Ok(true)
    }

    fn mark_written(&mut self, table: &str, id: RowId) {
        self.written.entry(table.to_string()).or_default().insert(id);
    }

    pub(crate) fn mark_committed(&mut self) -> Result<()> {
        self.ensure_active("commit")?;
        self.state = TransactionState::Committed;
        Ok(())
    }

    pub(crate) fn mark_aborted(&mut self) -> Result<()> {
        self.ensure_active("rollback")?;
        self.state = TransactionState::Aborted;
        Ok(())
    }

    pub(crate) fn ensure_active(&self, operation: &str) -> Result<()> {
        if !self.state.is_active() {
            return Err(DbError::TransactionError(format!(
                "Cannot {}: transaction {} is already {}",
                operation, self.id, self.state
            )));
        }
        Ok(())
    }
}
