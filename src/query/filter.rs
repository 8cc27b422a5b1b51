// ============================================================================
// Composable row filters
// ============================================================================
//
// A filter is a list of clauses that are ANDed together. Clauses are never
// merged by key, so adding a clause can't clobber one that is already there.
// A qualified clause groups conditions that apply to one named table, which is
// how the default visibility scope attaches itself to a query.
//
// ============================================================================

use crate::core::{DbError, Result, Row, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Equality. `Eq(Value::Null)` matches NULL, like `IsNull`.
    Eq(Value),
    /// Inequality. NULL never matches.
    NotEq(Value),
    IsNull,
    IsNotNull,
    /// Membership. NULL never matches.
    In(Vec<Value>),
}

impl Condition {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Condition::Eq(Value::Null) | Condition::IsNull => value.is_null(),
            Condition::Eq(expected) => value == expected,
            Condition::NotEq(Value::Null) | Condition::IsNotNull => !value.is_null(),
            Condition::NotEq(expected) => !value.is_null() && value != expected,
            Condition::In(values) => !value.is_null() && values.contains(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Clause {
    Column { column: String, condition: Condition },
    Qualified { table: String, filter: Filter },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(mut self, column: impl Into<String>, condition: Condition) -> Self {
        self.clauses.push(Clause::Column {
            column: column.into(),
            condition,
        });
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(column, Condition::Eq(value.into()))
    }

    pub fn not_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(column, Condition::NotEq(value.into()))
    }

    pub fn is_null(self, column: impl Into<String>) -> Self {
        self.condition(column, Condition::IsNull)
    }

    pub fn is_not_null(self, column: impl Into<String>) -> Self {
        self.condition(column, Condition::IsNotNull)
    }

    pub fn in_list<V: Into<Value>>(
        self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.condition(column, Condition::In(values))
    }

    /// Adds a group of conditions scoped to `table`.
    pub fn qualified(mut self, table: impl Into<String>, filter: Filter) -> Self {
        self.clauses.push(Clause::Qualified {
            table: table.into(),
            filter,
        });
        self
    }

    /// ANDs every clause of `other` onto this filter.
    pub fn and(mut self, other: Filter) -> Self {
        self.clauses.extend(other.clauses);
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Whether any clause, at any depth, constrains `column`.
    pub fn references(&self, column: &str) -> bool {
        self.clauses.iter().any(|clause| match clause {
            Clause::Column { column: name, .. } => name == column,
            Clause::Qualified { filter, .. } => filter.references(column),
        })
    }

    /// Copy of this filter with every clause on `column` removed, including
    /// inside qualified groups. Groups left empty are dropped; every other
    /// clause is kept as is.
    pub fn without_column(&self, column: &str) -> Filter {
        let clauses = self
            .clauses
            .iter()
            .filter_map(|clause| match clause {
                Clause::Column { column: name, .. } if name == column => None,
                Clause::Column { .. } => Some(clause.clone()),
                Clause::Qualified { table, filter } => {
                    let filter = filter.without_column(column);
                    (!filter.is_empty()).then(|| Clause::Qualified {
                        table: table.clone(),
                        filter,
                    })
                }
            })
            .collect();
        Filter { clauses }
    }

    /// Evaluates the filter against a row of `table`. Missing attributes read
    /// as NULL.
    pub fn matches(&self, table: &str, row: &Row) -> Result<bool> {
        for clause in &self.clauses {
            let matched = match clause {
                Clause::Column { column, condition } => {
                    condition.matches(row.get(column).unwrap_or(&Value::Null))
                }
                Clause::Qualified {
                    table: qualifier,
                    filter,
                } => {
                    if qualifier != table {
                        return Err(DbError::UnsupportedOperation(format!(
                            "filter qualified with '{}' can't be applied to '{}'",
                            qualifier, table
                        )));
                    }
                    filter.matches(table, row)?
                }
            };
            if !matched {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
