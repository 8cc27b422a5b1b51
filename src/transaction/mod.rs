// ============================================================================
// Transaction Management Module
// ============================================================================
//
// Optimistic snapshot transactions over the in-memory tables.
//
// - State Pattern: Active -> Committed / Aborted
// - Copy-on-Write: each transaction works on an O(1) clone of the tables
// - First committer wins: a commit fails if a table it wrote moved on
//
// ============================================================================

pub mod change;
pub mod manager;
pub mod state;

pub use change::Change;
pub use manager::{TransactionManager, TransactionStats};
pub use state::{Transaction, TransactionId, TransactionState};
