use crate::core::{ID_COLUMN, Row, RowId, Value};
use crate::query::DEACTIVATED_AT;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

static NULL: Value = Value::Null;

/// An in-memory copy of one row of a model, with dirty tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    model: String,
    id: Option<RowId>,
    attributes: Row,
    #[serde(skip)]
    changed: BTreeSet<String>,
}

impl Record {
    /// A new, unsaved record.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            id: None,
            attributes: Row::new(),
            changed: BTreeSet::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub(crate) fn from_row(model: &str, row: &Row) -> Self {
        let id = row
            .get(ID_COLUMN)
            .and_then(Value::as_i64)
            .map(|id| id as RowId);
        let mut attributes = row.clone();
        attributes.remove(ID_COLUMN);

        Self {
            model: model.to_string(),
            id,
            attributes,
            changed: BTreeSet::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn id(&self) -> Option<RowId> {
        self.id
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Attribute value; unknown and unset attributes read as NULL.
    pub fn get(&self, name: &str) -> &Value {
        self.attributes.get(name).unwrap_or(&NULL)
    }

    /// Sets an attribute and marks it changed. The id is assigned by the
    /// table and can't be set this way.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        if name == ID_COLUMN {
            return;
        }
        self.attributes.insert(name.clone(), value.into());
        self.changed.insert(name);
    }

    pub fn attributes(&self) -> &Row {
        &self.attributes
    }

    pub fn changed(&self) -> &BTreeSet<String> {
        &self.changed
    }

    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    /// The changed attributes only.
    pub(crate) fn changes(&self) -> Row {
        self.changed
            .iter()
            .map(|name| (name.clone(), self.get(name).clone()))
            .collect()
    }

    pub(crate) fn mark_saved(&mut self, id: RowId) {
        self.id = Some(id);
        self.changed.clear();
    }

    pub(crate) fn replace_with(&mut self, fresh: Record) {
        *self = fresh;
    }

    pub fn deactivated_at(&self) -> Option<DateTime<Utc>> {
        self.get(DEACTIVATED_AT).as_timestamp()
    }

    pub fn is_deactivated(&self) -> bool {
        !self.get(DEACTIVATED_AT).is_null()
    }
}
