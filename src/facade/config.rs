use crate::core::{DbError, Result};
use serde::{Deserialize, Serialize};

/// Database configuration
///
/// ```
/// use deactivatedb::DatabaseConfig;
///
/// let config = DatabaseConfig::new().name("inventory").max_cascade_depth(8);
/// assert_eq!(config.max_cascade_depth, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Name used in log output
    pub name: String,

    /// Deepest dependency chain a single deactivate / activate may follow
    pub max_cascade_depth: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: "deactivatedb".to_string(),
            max_cascade_depth: 64,
        }
    }
}

impl DatabaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database name
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the maximum cascade depth
    pub fn max_cascade_depth(mut self, depth: usize) -> Self {
        self.max_cascade_depth = depth;
        self
    }

    /// Parse from a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: DatabaseConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_cascade_depth == 0 {
            return Err(DbError::ConfigError(
                "max_cascade_depth must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
