use super::ModelDescriptor;
use crate::core::{DbError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registered model descriptors, keyed by model name.
///
/// Readers get an `Arc` to the descriptor as it was at lookup time. Updates
/// copy on write, so a cascade already holding a descriptor keeps a
/// consistent view.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: RwLock<HashMap<String, Arc<ModelDescriptor>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, descriptor: ModelDescriptor) -> Result<Arc<ModelDescriptor>> {
        let mut models = self.models.write()?;
        if models.contains_key(descriptor.name()) {
            return Err(DbError::ModelExists(descriptor.name().to_string()));
        }
        let descriptor = Arc::new(descriptor);
        models.insert(descriptor.name().to_string(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    pub fn get(&self, name: &str) -> Result<Arc<ModelDescriptor>> {
        self.models
            .read()?
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::ModelNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.models.read()?.contains_key(name))
    }

    /// Mutates a descriptor in place. Nothing is stored if `f` fails.
    pub fn update<T, F>(&self, name: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut ModelDescriptor) -> Result<T>,
    {
        let mut models = self.models.write()?;
        let slot = models
            .get_mut(name)
            .ok_or_else(|| DbError::ModelNotFound(name.to_string()))?;

        let mut draft = ModelDescriptor::clone(slot);
        let value = f(&mut draft)?;
        *slot = Arc::new(draft);
        Ok(value)
    }
}
