pub mod engine;
pub mod memory;
pub mod table;

pub use engine::StorageEngine;
pub use memory::{InMemoryStorage, TableSet};
pub use table::Table;
