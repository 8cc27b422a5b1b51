pub mod error;
pub mod types;
pub mod value;

pub use error::{DbError, Result};
pub use types::{Column, ID_COLUMN, Row, RowId, Schema};
pub use value::{DataType, Value};
