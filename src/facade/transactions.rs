use super::Database;
use crate::core::{DbError, Result, RowId};
use crate::model::Record;
use crate::query::{Query, executor};
use crate::transaction::{Change, Transaction, TransactionId, TransactionState};
use tracing::{Level, event};

/// How a save treats the model's validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Validate,
    SkipValidation,
}

/// A transaction bound to the database that started it.
///
/// Reads see the snapshot taken at `begin` plus this transaction's own
/// writes. Dropping a transaction that was neither committed nor rolled back
/// rolls it back.
pub struct DbTransaction<'db> {
    db: &'db Database,
    inner: Transaction,
}

impl<'db> DbTransaction<'db> {
    pub(crate) fn new(db: &'db Database, inner: Transaction) -> Self {
        Self { db, inner }
    }

    pub fn id(&self) -> TransactionId {
        self.inner.id()
    }

    pub fn state(&self) -> TransactionState {
        self.inner.state()
    }

    pub fn changes(&self) -> &[Change] {
        self.inner.changes()
    }

    pub(crate) fn database(&self) -> &'db Database {
        self.db
    }

    pub fn all(&self, query: &Query) -> Result<Vec<Record>> {
        let model = self.db.model(query.model())?;
        executor::execute(self.inner.tables(), &model, query)
    }

    pub fn first(&self, query: &Query) -> Result<Option<Record>> {
        Ok(self.all(&query.clone().limit(1))?.into_iter().next())
    }

    pub fn count(&self, query: &Query) -> Result<usize> {
        Ok(self.all(query)?.len())
    }

    /// Whether row `id` of `model` is visible under the effective scope.
    pub fn exists(&self, model: &str, id: RowId) -> Result<bool> {
        Ok(self.first(&Query::new(model).id(id))?.is_some())
    }

    pub fn find(&self, model: &str, id: RowId) -> Result<Record> {
        self.first(&Query::new(model).id(id))?
            .ok_or_else(|| DbError::RecordNotFound {
                model: model.to_string(),
                id,
            })
    }

    /// Loads association `name` of `record`. Subject to the target model's
    /// visibility like any other query.
    pub fn associated(&self, record: &Record, name: &str) -> Result<Vec<Record>> {
        let owner = self.db.model(record.model())?;
        match owner.association(name)?.scope_for(record) {
            Some(query) => self.all(&query),
            None => Ok(Vec::new()),
        }
    }

    /// Inserts an unsaved record, or writes the changed attributes of a
    /// saved one.
    pub fn save(&mut self, record: &mut Record, mode: SaveMode) -> Result<()> {
        let model = self.db.model(record.model())?;
        if mode == SaveMode::Validate {
            model.validate(record)?;
        }

        let id = match record.id() {
            None => self
                .inner
                .insert(model.name(), record.attributes().clone())?,
            Some(id) => {
                if !record.has_changes() {
                    return Ok(());
                }
                if !self.inner.update(model.name(), id, record.changes())? {
                    return Err(DbError::RecordNotFound {
                        model: model.name().to_string(),
                        id,
                    });
                }
                id
            }
        };

        record.mark_saved(id);
        event!(Level::TRACE, txn = %self.inner.id(), model = %model.name(), id, "record saved");
        Ok(())
    }

    pub async fn commit(mut self) -> Result<()> {
        self.db.transactions().commit(&mut self.inner).await
    }

    pub fn rollback(mut self) -> Result<()> {
        self.db.transactions().rollback(&mut self.inner)
    }
}

impl Drop for DbTransaction<'_> {
    fn drop(&mut self) {
        if self.inner.state().is_active()
            && let Err(err) = self.db.transactions().rollback(&mut self.inner)
        {
            event!(Level::WARN, txn = %self.inner.id(), error = %err, "rollback on drop failed");
        }
    }
}
