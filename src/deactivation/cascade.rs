// ============================================================================
// Deactivation cascade
// ============================================================================
//
// deactivate / activate on one record:
//
//   begin ─> set or clear deactivated_at (in memory)
//         ─> for each configured dependency:
//              lift the target's default scope,
//              load the dependents, transition each one recursively
//         ─> save the record ─> commit
//
// Dependents are saved before their owner. Any error rolls the whole
// transaction back and restores the caller's record.
//
// ============================================================================

use crate::core::{DbError, Result, RowId, Value};
use crate::facade::{Database, DbTransaction, SaveMode};
use crate::model::Record;
use crate::query::DEACTIVATED_AT;
use async_recursion::async_recursion;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;
use tracing::{Instrument, Level, event, info_span};

use super::scope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Deactivate,
    Activate,
}

impl Transition {
    /// Deactivation writes the timestamp even on records that no longer
    /// validate. Activation must leave every record valid.
    pub fn save_mode(self) -> SaveMode {
        match self {
            Transition::Deactivate => SaveMode::SkipValidation,
            Transition::Activate => SaveMode::Validate,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Deactivate => write!(f, "deactivate"),
            Transition::Activate => write!(f, "activate"),
        }
    }
}

/// Runs `transition` on `record` and everything it cascades to, in one
/// transaction.
pub(crate) async fn run(db: &Database, record: &mut Record, transition: Transition) -> Result<()> {
    let span = info_span!(
        "deactivation.cascade",
        model = %record.model(),
        id = ?record.id(),
        %transition
    );
    let original = record.clone();

    let result = async {
        let mut txn = db.begin().await;
        let mut cascade = Cascade::new(db.config().max_cascade_depth);

        match cascade.transition(&mut txn, record, transition, 0).await {
            Ok(()) => {
                txn.commit().await?;
                event!(
                    Level::DEBUG,
                    records = cascade.visited.len(),
                    "cascade committed"
                );
                Ok(())
            }
            Err(err) => {
                txn.rollback()?;
                Err(err)
            }
        }
    }
    .instrument(span.clone())
    .await;

    if let Err(err) = &result {
        *record = original;
        span.in_scope(|| event!(Level::WARN, error = %err, "cascade rolled back"));
    }
    result
}

struct Cascade {
    /// Rows already transitioned, so association cycles terminate
    visited: HashSet<(String, RowId)>,
    max_depth: usize,
    /// One timestamp for the root and every dependent
    now: DateTime<Utc>,
}

impl Cascade {
    fn new(max_depth: usize) -> Self {
        Self {
            visited: HashSet::new(),
            max_depth,
            now: Utc::now(),
        }
    }

    #[async_recursion]
    async fn transition<'db>(
        &mut self,
        txn: &mut DbTransaction<'db>,
        record: &mut Record,
        transition: Transition,
        depth: usize,
    ) -> Result<()> {
        if depth > self.max_depth {
            return Err(DbError::CascadeDepthExceeded(self.max_depth));
        }

        let model = txn.database().model(record.model())?;
        let config = model
            .deactivation()
            .ok_or_else(|| DbError::NotDeactivatable(model.name().to_string()))?;

        if let Some(id) = record.id() {
            self.visited.insert((model.name().to_string(), id));
        }

        match transition {
            Transition::Deactivate => record.set(DEACTIVATED_AT, self.now),
            Transition::Activate => record.set(DEACTIVATED_AT, Value::Null),
        }

        for dependency in config.dependencies() {
            let association = model.association(&dependency.association)?;
            let Some(query) = association.scope_for(record) else {
                event!(
                    Level::TRACE,
                    association = %dependency.association,
                    "no dependents to resolve"
                );
                continue;
            };
            let target = association.target();

            scope::remove_deactivated_objects_scope(target, async {
                let dependents = txn.all(&query)?;
                event!(
                    Level::DEBUG,
                    association = %dependency.association,
                    target = %target,
                    count = dependents.len(),
                    depth,
                    "cascading {}",
                    transition
                );

                for mut dependent in dependents {
                    let seen = dependent
                        .id()
                        .is_some_and(|id| self.visited.contains(&(target.to_string(), id)));
                    if seen {
                        continue;
                    }
                    self.transition(txn, &mut dependent, transition, depth + 1)
                        .await?;
                }
                Ok::<(), DbError>(())
            })
            .await?;
        }

        txn.save(record, transition.save_mode())
    }
}
