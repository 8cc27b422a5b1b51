use super::{Filter, Query, Visibility};
use crate::core::Result;
use crate::deactivation::scope;
use crate::model::{ModelDescriptor, Record};
use crate::storage::StorageEngine;

/// Explicit query visibility, else the innermost override of the current
/// task, else the model default.
pub(crate) fn resolve_visibility(query: &Query, model: &ModelDescriptor) -> Visibility {
    query
        .explicit_visibility()
        .or_else(|| scope::current_override(model.name()))
        .unwrap_or_else(|| model.default_visibility())
}

pub(crate) fn effective_filter(query: &Query, model: &ModelDescriptor) -> Result<Filter> {
    let mut filter = query.caller_filter().clone();
    for name in query.scopes() {
        filter = filter.and(model.named_scope(name)?.clone());
    }

    if !model.is_deactivatable() {
        return Ok(filter);
    }
    Ok(resolve_visibility(query, model).apply(model.name(), &filter))
}

pub(crate) fn execute<S>(tables: &S, model: &ModelDescriptor, query: &Query) -> Result<Vec<Record>>
where
    S: StorageEngine + ?Sized,
{
    let filter = effective_filter(query, model)?;
    let table = tables.table(model.name())?;
    let limit = query.max_rows().unwrap_or(usize::MAX);

    let mut records = Vec::new();
    for row in table.scan() {
        if records.len() >= limit {
            break;
        }
        if filter.matches(model.name(), row)? {
            records.push(Record::from_row(model.name(), row));
        }
    }
    Ok(records)
}
