use super::Filter;
use serde::{Deserialize, Serialize};

/// Column that marks a row inactive when non-NULL.
pub const DEACTIVATED_AT: &str = "deactivated_at";

/// Which rows of a deactivatable model a query can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    /// `deactivated_at IS NULL`, the default scope
    ActiveOnly,
    /// `deactivated_at IS NOT NULL`
    InactiveOnly,
    /// No constraint on `deactivated_at`
    All,
}

impl Visibility {
    /// Composes the visibility constraint with a caller filter on `table`.
    ///
    /// `ActiveOnly` ANDs onto the caller's clauses. The two escapes first lift
    /// every `deactivated_at` clause, then `InactiveOnly` adds its own.
    pub fn apply(self, table: &str, filter: &Filter) -> Filter {
        match self {
            Visibility::ActiveOnly => filter
                .clone()
                .qualified(table, Filter::new().is_null(DEACTIVATED_AT)),
            Visibility::InactiveOnly => filter
                .without_column(DEACTIVATED_AT)
                .qualified(table, Filter::new().is_not_null(DEACTIVATED_AT)),
            Visibility::All => filter.without_column(DEACTIVATED_AT),
        }
    }
}
