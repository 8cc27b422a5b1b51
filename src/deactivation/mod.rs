// ============================================================================
// Deactivation
// ============================================================================
//
// Soft deletion for adopted models. A record is inactive while its
// `deactivated_at` column holds a timestamp and active while it is NULL.
//
// - config:  which associations a transition cascades through
// - scope:   task-local visibility overrides
// - cascade: the transactional deactivate / activate traversal
//
// ============================================================================

pub mod cascade;
pub mod config;
pub mod scope;

pub use cascade::Transition;
pub use config::{DeactivationConfig, DeactivationOptions, DependencySpec};

use crate::core::Result;
use crate::facade::Database;
use crate::model::Record;
use async_trait::async_trait;

/// Deactivation entry points on a record.
///
/// ```ignore
/// use deactivatedb::Deactivatable;
///
/// item.deactivate(&db).await?;
/// assert!(item.is_deactivated());
/// ```
#[async_trait]
pub trait Deactivatable {
    async fn deactivate(&mut self, db: &Database) -> Result<()>;

    async fn activate(&mut self, db: &Database) -> Result<()>;

    fn is_deactivated(&self) -> bool;
}

#[async_trait]
impl Deactivatable for Record {
    async fn deactivate(&mut self, db: &Database) -> Result<()> {
        db.deactivate(self).await
    }

    async fn activate(&mut self, db: &Database) -> Result<()> {
        db.activate(self).await
    }

    fn is_deactivated(&self) -> bool {
        Record::is_deactivated(self)
    }
}
