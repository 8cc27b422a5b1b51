use crate::core::Result;
use crate::model::{Cardinality, ModelDescriptor};
use serde::{Deserialize, Serialize};

/// How a model adopts deactivation.
///
/// ```
/// use deactivatedb::DeactivationOptions;
///
/// let options = DeactivationOptions::new()
///     .dependency("deps")
///     .auto_configure_dependencies(true);
/// assert_eq!(options.dependencies, vec!["deps".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeactivationOptions {
    /// Associations that transition along with the record, in order
    pub dependencies: Vec<String>,
    /// Also cascade through every association declared with a destructive
    /// dependent action at configuration time
    pub auto_configure_dependencies: bool,
}

impl DeactivationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dependency(mut self, association: impl Into<String>) -> Self {
        self.dependencies.push(association.into());
        self
    }

    pub fn dependencies<I, S>(mut self, associations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .extend(associations.into_iter().map(Into::into));
        self
    }

    pub fn auto_configure_dependencies(mut self, enabled: bool) -> Self {
        self.auto_configure_dependencies = enabled;
        self
    }

    /// Resolves the dependency list against the associations `model` has
    /// right now. Associations declared later are not picked up.
    pub fn resolve(&self, model: &ModelDescriptor) -> Result<DeactivationConfig> {
        let mut names: Vec<&str> = Vec::new();
        for name in &self.dependencies {
            model.association(name)?;
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }

        if self.auto_configure_dependencies {
            for association in model.associations() {
                let destructive = association
                    .dependent_action()
                    .is_some_and(|action| action.is_destructive());
                if destructive && !names.contains(&association.name()) {
                    names.push(association.name());
                }
            }
        }

        let dependencies = names
            .into_iter()
            .map(|name| {
                let association = model.association(name)?;
                Ok(DependencySpec {
                    association: association.name().to_string(),
                    target: association.target().to_string(),
                    cardinality: association.cardinality(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DeactivationConfig {
            options: self.clone(),
            dependencies,
        })
    }
}

/// One association a transition cascades through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub association: String,
    pub target: String,
    pub cardinality: Cardinality,
}

/// Deactivation settings of an adopted model, resolved once when the model is
/// configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivationConfig {
    options: DeactivationOptions,
    dependencies: Vec<DependencySpec>,
}

impl DeactivationConfig {
    pub fn options(&self) -> &DeactivationOptions {
        &self.options
    }

    pub fn dependencies(&self) -> &[DependencySpec] {
        &self.dependencies
    }

    pub fn dependency_names(&self) -> Vec<&str> {
        self.dependencies
            .iter()
            .map(|dependency| dependency.association.as_str())
            .collect()
    }
}
