use super::table::Table;
use crate::core::Result;

/// Storage engine trait - the table access a query or a transaction needs.
pub trait StorageEngine: Send + Sync {
    /// Register a new table
    fn create_table(&mut self, table: Table) -> Result<()>;

    /// Borrow a table by name
    fn table(&self, name: &str) -> Result<&Table>;

    /// Mutably borrow a table by name
    fn table_mut(&mut self, name: &str) -> Result<&mut Table>;

    /// Get table row count
    fn row_count(&self, name: &str) -> Result<usize> {
        Ok(self.table(name)?.row_count())
    }
}
