pub mod config;
pub mod database;
pub mod transactions;

pub use config::DatabaseConfig;
pub use database::Database;
pub use transactions::{DbTransaction, SaveMode};
