use super::{DatabaseConfig, DbTransaction, SaveMode};
use crate::core::{Column, DataType, DbError, Result, RowId};
use crate::deactivation::cascade::{self, Transition};
use crate::deactivation::{DeactivationOptions, scope};
use crate::model::{Association, AssociationKind, ModelDescriptor, ModelRegistry, Record};
use crate::query::{DEACTIVATED_AT, Query, executor};
use crate::storage::{InMemoryStorage, Table};
use crate::transaction::{TransactionManager, TransactionStats};
use std::future::Future;
use std::sync::Arc;
use tracing::{Level, event};

/// Handle to one in-memory database. Cloning is cheap and every clone shares
/// the same tables and models.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    config: DatabaseConfig,
    storage: Arc<InMemoryStorage>,
    registry: ModelRegistry,
    transactions: TransactionManager,
}

impl Default for Database {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Database {
    pub fn new(config: DatabaseConfig) -> Self {
        let storage = Arc::new(InMemoryStorage::new());
        Self {
            inner: Arc::new(DatabaseInner {
                config,
                transactions: TransactionManager::new(Arc::clone(&storage)),
                storage,
                registry: ModelRegistry::new(),
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(DatabaseConfig::default())
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.inner.config
    }

    pub fn transaction_stats(&self) -> TransactionStats {
        self.inner.transactions.stats()
    }

    pub(crate) fn transactions(&self) -> &TransactionManager {
        &self.inner.transactions
    }

    pub fn model(&self, name: &str) -> Result<Arc<ModelDescriptor>> {
        self.inner.registry.get(name)
    }

    // ------------------------------------------------------------------------
    // Schema
    // ------------------------------------------------------------------------

    /// Creates the model's table and registers the model.
    pub async fn define_model(&self, descriptor: ModelDescriptor) -> Result<()> {
        if self.inner.registry.contains(descriptor.name())? {
            return Err(DbError::ModelExists(descriptor.name().to_string()));
        }

        self.inner
            .storage
            .create_table(Table::new(descriptor.name(), descriptor.schema().clone()))
            .await?;
        let descriptor = self.inner.registry.register(descriptor)?;

        event!(
            Level::DEBUG,
            db = %self.inner.config.name,
            model = %descriptor.name(),
            columns = descriptor.schema().column_count(),
            "model defined"
        );
        Ok(())
    }

    /// Adds an association to an already defined model. A deactivation
    /// configuration resolved earlier does not see it.
    pub fn declare_association(&self, model: &str, association: Association) -> Result<()> {
        self.inner.registry.update(model, |descriptor| {
            descriptor.add_association(association);
            Ok(())
        })
    }

    /// Adopts deactivation for `model`: adds the `deactivated_at` column and
    /// attaches the resolved dependency list. Calling it again replaces the
    /// configuration.
    pub async fn acts_as_deactivatable(
        &self,
        model: &str,
        options: DeactivationOptions,
    ) -> Result<()> {
        let config = options.resolve(&*self.model(model)?)?;
        let column = Column::new(DEACTIVATED_AT, DataType::Timestamp);

        self.inner.storage.add_column(model, column.clone()).await?;
        self.inner.registry.update(model, |descriptor| {
            descriptor.add_column(column);
            descriptor.set_deactivation(config.clone());
            Ok(())
        })?;

        event!(
            Level::INFO,
            db = %self.inner.config.name,
            model,
            dependencies = ?config.dependency_names(),
            "model is deactivatable"
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    pub fn query(&self, model: &str) -> Query {
        Query::new(model)
    }

    pub async fn begin(&self) -> DbTransaction<'_> {
        DbTransaction::new(self, self.inner.transactions.begin().await)
    }

    /// Rows of the query's model visible under the effective scope, in id
    /// order.
    pub async fn all(&self, query: &Query) -> Result<Vec<Record>> {
        let model = self.model(query.model())?;
        let tables = self.inner.storage.snapshot().await;
        executor::execute(&tables, &model, query)
    }

    pub async fn first(&self, query: &Query) -> Result<Option<Record>> {
        Ok(self
            .all(&query.clone().limit(1))
            .await?
            .into_iter()
            .next())
    }

    pub async fn count(&self, query: &Query) -> Result<usize> {
        Ok(self.all(query).await?.len())
    }

    pub async fn exists(&self, model: &str, id: RowId) -> Result<bool> {
        Ok(self.first(&Query::new(model).id(id)).await?.is_some())
    }

    pub async fn find(&self, model: &str, id: RowId) -> Result<Record> {
        self.first(&Query::new(model).id(id))
            .await?
            .ok_or_else(|| DbError::RecordNotFound {
                model: model.to_string(),
                id,
            })
    }

    /// Replaces `record` with its stored state. Fails with `RecordNotFound`
    /// when the row isn't visible under the effective scope.
    pub async fn reload(&self, record: &mut Record) -> Result<()> {
        let id = record.id().ok_or_else(|| {
            DbError::UnsupportedOperation(format!(
                "can't reload an unsaved '{}' record",
                record.model()
            ))
        })?;
        let fresh = self.find(record.model(), id).await?;
        record.replace_with(fresh);
        Ok(())
    }

    pub async fn associated(&self, record: &Record, name: &str) -> Result<Vec<Record>> {
        let owner = self.model(record.model())?;
        match owner.association(name)?.scope_for(record) {
            Some(query) => self.all(&query).await,
            None => Ok(Vec::new()),
        }
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Unsaved target record of a has-many / has-one association of a saved
    /// owner, with its foreign key set.
    pub fn build_associated(&self, owner: &Record, name: &str) -> Result<Record> {
        let descriptor = self.model(owner.model())?;
        let association = descriptor.association(name)?;

        if association.kind() == AssociationKind::BelongsTo {
            return Err(DbError::UnsupportedOperation(format!(
                "can't build through belongs-to association '{}'",
                name
            )));
        }
        let owner_id = owner.id().ok_or_else(|| {
            DbError::UnsupportedOperation(format!(
                "can't build '{}' for an unsaved '{}' record",
                name,
                owner.model()
            ))
        })?;
        Ok(association.build_for(owner_id))
    }

    /// Validates and inserts `record`, returning the saved copy.
    pub async fn create(&self, mut record: Record) -> Result<Record> {
        self.save(&mut record).await?;
        Ok(record)
    }

    pub async fn save(&self, record: &mut Record) -> Result<()> {
        self.save_in_transaction(record, SaveMode::Validate).await
    }

    pub async fn save_without_validation(&self, record: &mut Record) -> Result<()> {
        self.save_in_transaction(record, SaveMode::SkipValidation)
            .await
    }

    async fn save_in_transaction(&self, record: &mut Record, mode: SaveMode) -> Result<()> {
        let original = record.clone();
        let mut txn = self.begin().await;

        let result = match txn.save(record, mode) {
            Ok(()) => txn.commit().await,
            Err(err) => {
                txn.rollback()?;
                Err(err)
            }
        };

        if result.is_err() {
            *record = original;
        }
        result
    }

    // ------------------------------------------------------------------------
    // Deactivation
    // ------------------------------------------------------------------------

    /// Deactivates `record` and its configured dependents in one transaction.
    /// On error nothing is written and `record` is left as it was.
    pub async fn deactivate(&self, record: &mut Record) -> Result<()> {
        cascade::run(self, record, Transition::Deactivate).await
    }

    /// Reactivates `record` and its configured dependents in one transaction.
    pub async fn activate(&self, record: &mut Record) -> Result<()> {
        cascade::run(self, record, Transition::Activate).await
    }

    /// Runs `body` seeing only the deactivated rows of `model`.
    pub async fn with_deactivated_objects_scope<F>(&self, model: &str, body: F) -> F::Output
    where
        F: Future,
    {
        scope::with_deactivated_objects_scope(model, body).await
    }

    /// Runs `body` seeing every row of `model`.
    pub async fn remove_deactivated_objects_scope<F>(&self, model: &str, body: F) -> F::Output
    where
        F: Future,
    {
        scope::remove_deactivated_objects_scope(model, body).await
    }
}
