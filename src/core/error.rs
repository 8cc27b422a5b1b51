use super::types::RowId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Validation failed for '{model}': {}", .errors.join(", "))]
    ValidationFailed { model: String, errors: Vec<String> },

    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Model '{0}' is already defined")]
    ModelExists(String),

    #[error("Model '{0}' not found")]
    ModelNotFound(String),

    #[error("Column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Association '{association}' is not declared on '{model}'")]
    AssociationNotFound { model: String, association: String },

    #[error("Scope '{scope}' is not declared on '{model}'")]
    ScopeNotFound { model: String, scope: String },

    #[error("Couldn't find '{model}' with id {id}")]
    RecordNotFound { model: String, id: RowId },

    #[error("Model '{0}' is not deactivatable")]
    NotDeactivatable(String),

    #[error("Cascade exceeded the maximum depth of {0}")]
    CascadeDepthExceeded(usize),

    #[error("Write conflict: {0}")]
    WriteConflict(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}
