use crate::core::{Column, DbError, ID_COLUMN, Result, Row, RowId, Schema, Value};
use im::OrdMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A table of rows keyed by id.
///
/// Rows live in a persistent map so that cloning a table (and therefore
/// taking a transaction snapshot) is O(1); writes only copy the touched path.
///
/// Every clone of a table draws ids from the same sequence, so rows inserted
/// by concurrent transactions never share an id. Ids of rolled back inserts
/// are not reused.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    schema: Schema,
    rows: OrdMap<RowId, Row>,
    /// Per-row commit counter. Rows never committed have no entry.
    row_versions: OrdMap<RowId, u64>,
    sequence: Arc<AtomicU64>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            rows: OrdMap::new(),
            row_versions: OrdMap::new(),
            sequence: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// How many commits have written row `id`, or `None` if none has.
    pub fn row_version(&self, id: RowId) -> Option<u64> {
        self.row_versions.get(&id).copied()
    }

    /// Stores `row` as committed and bumps its version.
    pub(crate) fn install_row(&mut self, id: RowId, row: Row) {
        let version = self.row_version(id).unwrap_or(0) + 1;
        self.rows.insert(id, row);
        self.row_versions.insert(id, version);
    }

    /// Adds a column. Existing rows read it as NULL.
    pub fn add_column(&mut self, column: Column) -> bool {
        self.schema.add_column(column)
    }

    pub fn insert(&mut self, mut row: Row) -> Result<RowId> {
        row.remove(ID_COLUMN);
        self.validate_row(&row)?;

        let id = self.sequence.fetch_add(1, Ordering::Relaxed);

        row.insert(ID_COLUMN.to_string(), Value::from(id));
        self.rows.insert(id, row);
        Ok(id)
    }

    /// Merges `changes` into the stored row. Returns `false` when no row has `id`.
    pub fn update(&mut self, id: RowId, changes: &Row) -> Result<bool> {
        let Some(current) = self.rows.get(&id) else {
            return Ok(false);
        };

        let mut merged = current.clone();
        for (name, value) in changes {
            if name == ID_COLUMN {
                continue;
            }
            merged.insert(name.clone(), value.clone());
        }

        let mut attributes = merged.clone();
        attributes.remove(ID_COLUMN);
        self.validate_row(&attributes)?;

        self.rows.insert(id, merged);
        Ok(true)
    }

    pub fn get(&self, id: RowId) -> Option<&Row> {
        self.rows.get(&id)
    }

    /// Rows in ascending id order.
    pub fn scan(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn validate_row(&self, row: &Row) -> Result<()> {
        for (name, value) in row {
            let column = self
                .schema
                .get_column(name)
                .ok_or_else(|| DbError::ColumnNotFound(name.clone(), self.name.clone()))?;
            column.validate(value)?;
        }

        for column in self.schema.columns() {
            if !column.nullable && !row.contains_key(&column.name) {
                return Err(DbError::ConstraintViolation(format!(
                    "Column '{}' cannot be NULL",
                    column.name
                )));
            }
        }

        Ok(())
    }
}
