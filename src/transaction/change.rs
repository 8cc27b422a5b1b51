// ============================================================================
// Transaction Change Tracking
// ============================================================================
//
// Every write a transaction performs against its working copy is recorded
// here. Rollback needs no undo: the working copy is simply discarded. The log
// exists for diagnostics and for callers that want to know what a cascade
// touched.
//
// ============================================================================

use crate::core::{Row, RowId};

/// A single write performed inside a transaction
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// A new row was inserted
    InsertRow { table: String, id: RowId, row: Row },

    /// Attributes of an existing row were overwritten
    UpdateRow {
        table: String,
        id: RowId,
        old_row: Row,
        changes: Row,
    },
}

impl Change {
    /// Get the table name affected by this change
    pub fn table_name(&self) -> &str {
        match self {
            Change::InsertRow { table, .. } => table,
            Change::UpdateRow { table, .. } => table,
        }
    }

    /// Get the id of the row affected by this change
    pub fn row_id(&self) -> RowId {
        match self {
            Change::InsertRow { id, .. } | Change::UpdateRow { id, .. } => *id,
        }
    }

    /// Whether the change touched `column`
    pub fn touches(&self, column: &str) -> bool {
        match self {
            Change::InsertRow { row, .. } => row.contains_key(column),
            Change::UpdateRow { changes, .. } => changes.contains_key(column),
        }
    }
}
