// ============================================================================
// deactivatedb Library
// ============================================================================
//
// An in-memory record store where records are deactivated instead of
// deleted. Default queries only see active rows; callers can temporarily see
// inactive rows or all rows; deactivate / activate cascade through configured
// associations inside one transaction.
//
// ============================================================================

//! # Examples
//!
//! ```
//! use deactivatedb::{
//!     Column, DataType, Database, DeactivationOptions, ModelDescriptor, Record,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> deactivatedb::Result<()> {
//! let db = Database::in_memory();
//! db.define_model(
//!     ModelDescriptor::builder("items")
//!         .column(Column::new("name", DataType::Text))
//!         .build(),
//! )
//! .await?;
//! db.acts_as_deactivatable("items", DeactivationOptions::new())
//!     .await?;
//!
//! let mut item = db.create(Record::new("items").with("name", "lamp")).await?;
//! let id = item.id().unwrap();
//!
//! db.deactivate(&mut item).await?;
//! assert!(!db.exists("items", id).await?);
//!
//! let seen = db
//!     .with_deactivated_objects_scope("items", db.exists("items", id))
//!     .await?;
//! assert!(seen);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod deactivation;
pub mod facade;
pub mod model;
pub mod query;
pub mod storage;
pub mod transaction;

pub use core::{Column, DataType, DbError, Result, Row, RowId, Schema, Value};
pub use deactivation::{
    Deactivatable, DeactivationConfig, DeactivationOptions, DependencySpec, Transition,
};
pub use facade::{Database, DatabaseConfig, DbTransaction, SaveMode};
pub use model::{
    Association, AssociationKind, Cardinality, DependentAction, ModelBuilder, ModelDescriptor,
    ModelRegistry, Record,
};
pub use query::{Condition, DEACTIVATED_AT, Filter, Query, Visibility};
pub use transaction::TransactionStats;
