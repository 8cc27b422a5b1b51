// ============================================================================
// Queries
// ============================================================================
//
// A `Query` names a model, carries the caller's filter and optional named
// scopes, and may pin a visibility preset. The default scope is not part of
// the query: it is resolved at execution time from the model, so every read
// path (lookups, association traversal, chained filters) gets it the same way.
//
// ============================================================================

pub(crate) mod executor;
pub mod filter;
pub mod visibility;

pub use filter::{Clause, Condition, Filter};
pub use visibility::{DEACTIVATED_AT, Visibility};

use crate::core::{ID_COLUMN, RowId, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    model: String,
    filter: Filter,
    scopes: Vec<String>,
    visibility: Option<Visibility>,
    limit: Option<usize>,
}

impl Query {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            filter: Filter::new(),
            scopes: Vec::new(),
            visibility: None,
            limit: None,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// `column = value`
    pub fn filter(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = self.filter.eq(column, value);
        self
    }

    /// ANDs an arbitrary filter onto the query.
    pub fn where_filter(mut self, filter: Filter) -> Self {
        self.filter = self.filter.and(filter);
        self
    }

    pub fn id(self, id: RowId) -> Self {
        self.filter(ID_COLUMN, id)
    }

    /// Applies a scope declared on the model by name.
    pub fn named_scope(mut self, name: impl Into<String>) -> Self {
        self.scopes.push(name.into());
        self
    }

    /// Pins the visibility, overriding both the model default and any
    /// surrounding scope override.
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// The query with every `deactivated_at` clause lifted and all rows
    /// visible. Other clauses are untouched.
    pub fn unscope_deactivated(mut self) -> Self {
        self.filter = self.filter.without_column(DEACTIVATED_AT);
        self.visibility = Some(Visibility::All);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn caller_filter(&self) -> &Filter {
        &self.filter
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn explicit_visibility(&self) -> Option<Visibility> {
        self.visibility
    }

    pub fn max_rows(&self) -> Option<usize> {
        self.limit
    }
}
