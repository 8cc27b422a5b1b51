use super::{StorageEngine, Table};
use crate::core::{Column, DbError, Result, RowId};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;
use tracing::{Level, event};

/// A set of tables that can be cloned in O(1).
///
/// The committed database state is one `TableSet`; every transaction works on
/// its own clone of it.
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    tables: im::HashMap<String, Table>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageEngine for TableSet {
    fn create_table(&mut self, table: Table) -> Result<()> {
        if self.tables.contains_key(table.name()) {
            return Err(DbError::TableExists(table.name().to_string()));
        }
        self.tables.insert(table.name().to_string(), table);
        Ok(())
    }

    fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }
}

/// Committed state shared by every handle of a database.
pub struct InMemoryStorage {
    committed: RwLock<TableSet>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            committed: RwLock::new(TableSet::new()),
        }
    }

    pub async fn create_table(&self, table: Table) -> Result<()> {
        let mut committed = self.committed.write().await;
        committed.create_table(table)
    }

    /// Adds a nullable column to a committed table. Transactions that began
    /// earlier keep writing rows without it.
    pub async fn add_column(&self, table_name: &str, column: Column) -> Result<bool> {
        let mut committed = self.committed.write().await;
        Ok(committed.table_mut(table_name)?.add_column(column))
    }

    /// Point-in-time copy of the committed tables.
    pub async fn snapshot(&self) -> TableSet {
        self.committed.read().await.clone()
    }

    /// Copies the rows listed in `written` from `working` into the committed
    /// state.
    ///
    /// Optimistic: fails without applying anything if any written row was
    /// committed by someone else after `base` was taken. Rows the transaction
    /// did not write are left as they are.
    pub async fn apply(
        &self,
        base: &TableSet,
        working: &TableSet,
        written: &BTreeMap<String, BTreeSet<RowId>>,
    ) -> Result<()> {
        let mut committed = self.committed.write().await;

        for (name, ids) in written {
            let base_table = base.table(name)?;
            let current_table = committed.table(name)?;
            for &id in ids {
                let base_version = base_table.row_version(id);
                let current_version = current_table.row_version(id);
                if base_version != current_version {
                    event!(
                        Level::DEBUG,
                        table = %name,
                        row = id,
                        ?base_version,
                        ?current_version,
                        "write conflict on commit"
                    );
                    return Err(DbError::WriteConflict(format!(
                        "row {} of '{}' changed since the transaction began",
                        id, name
                    )));
                }
            }
        }

        for (name, ids) in written {
            let source = working.table(name)?;
            let target = committed.table_mut(name)?;
            for &id in ids {
                if let Some(row) = source.get(id) {
                    target.install_row(id, row.clone());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, Row, Schema, Value};

    fn items() -> Table {
        Table::new(
            "items",
            Schema::new(vec![Column::new("status", DataType::Integer)]),
        )
    }

    fn status(value: i64) -> Row {
        Row::from([("status".to_string(), Value::Integer(value))])
    }

    fn written(ids: &[RowId]) -> BTreeMap<String, BTreeSet<RowId>> {
        BTreeMap::from([("items".to_string(), ids.iter().copied().collect())])
    }

    #[tokio::test]
    async fn test_create_table_twice_fails() {
        let storage = InMemoryStorage::new();
        storage.create_table(items()).await.unwrap();
        assert!(matches!(
            storage.create_table(items()).await,
            Err(DbError::TableExists(_))
        ));
        assert!(storage.snapshot().await.table("items").is_ok());
    }

    #[tokio::test]
    async fn test_apply_installs_written_rows() {
        let storage = InMemoryStorage::new();
        storage.create_table(items()).await.unwrap();

        let base = storage.snapshot().await;
        let mut working = base.clone();
        let id = working.table_mut("items").unwrap().insert(status(1)).unwrap();

        storage.apply(&base, &working, &written(&[id])).await.unwrap();

        let committed = storage.snapshot().await;
        assert_eq!(committed.row_count("items").unwrap(), 1);
        assert_eq!(committed.table("items").unwrap().row_version(id), Some(1));
    }

    #[tokio::test]
    async fn test_apply_merges_disjoint_writers() {
        let storage = InMemoryStorage::new();
        storage.create_table(items()).await.unwrap();

        let base = storage.snapshot().await;
        let mut first = base.clone();
        let mut second = base.clone();
        let a = first.table_mut("items").unwrap().insert(status(1)).unwrap();
        let b = second.table_mut("items").unwrap().insert(status(2)).unwrap();
        assert_ne!(a, b);

        storage.apply(&base, &first, &written(&[a])).await.unwrap();
        storage.apply(&base, &second, &written(&[b])).await.unwrap();

        let committed = storage.snapshot().await;
        let table = committed.table("items").unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(a).unwrap()["status"], Value::Integer(1));
        assert_eq!(table.get(b).unwrap()["status"], Value::Integer(2));
    }

    #[tokio::test]
    async fn test_apply_detects_conflict_on_same_row() {
        let storage = InMemoryStorage::new();
        storage.create_table(items()).await.unwrap();
        let setup = storage.snapshot().await;
        let mut seeded = setup.clone();
        let id = seeded.table_mut("items").unwrap().insert(status(0)).unwrap();
        storage.apply(&setup, &seeded, &written(&[id])).await.unwrap();

        let base = storage.snapshot().await;
        let mut first = base.clone();
        let mut second = base.clone();
        first.table_mut("items").unwrap().update(id, &status(1)).unwrap();
        second.table_mut("items").unwrap().update(id, &status(2)).unwrap();

        storage.apply(&base, &first, &written(&[id])).await.unwrap();
        let err = storage.apply(&base, &second, &written(&[id])).await.unwrap_err();
        assert!(matches!(err, DbError::WriteConflict(_)));

        let committed = storage.snapshot().await;
        assert_eq!(
            committed.table("items").unwrap().get(id).unwrap()["status"],
            Value::Integer(1)
        );
    }

    #[tokio::test]
    async fn test_added_column_survives_older_commit() {
        let storage = InMemoryStorage::new();
        storage.create_table(items()).await.unwrap();

        let base = storage.snapshot().await;
        let mut working = base.clone();
        let id = working.table_mut("items").unwrap().insert(status(1)).unwrap();

        let column = Column::new("deactivated_at", DataType::Timestamp);
        assert!(storage.add_column("items", column).await.unwrap());
        storage.apply(&base, &working, &written(&[id])).await.unwrap();

        let committed = storage.snapshot().await;
        let table = committed.table("items").unwrap();
        assert!(table.schema().has_column("deactivated_at"));
        assert_eq!(table.row_count(), 1);
    }
}
