use super::{Association, Record};
use crate::core::{Column, DbError, Result, Schema};
use crate::deactivation::DeactivationConfig;
use crate::query::{Filter, Visibility};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Validation hook run on validated saves. `Err` carries a human readable
/// message.
pub type Validator = Arc<dyn Fn(&Record) -> std::result::Result<(), String> + Send + Sync>;

/// Everything the persistence layer knows about one model type.
///
/// The model name doubles as its table name.
#[derive(Clone)]
pub struct ModelDescriptor {
    name: String,
    schema: Schema,
    associations: Vec<Association>,
    scopes: BTreeMap<String, Filter>,
    validators: Vec<(String, Validator)>,
    deactivation: Option<DeactivationConfig>,
}

impl fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("associations", &self.associations)
            .field("scopes", &self.scopes)
            .field(
                "validators",
                &self.validators.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("deactivation", &self.deactivation)
            .finish()
    }
}

impl ModelDescriptor {
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            descriptor: ModelDescriptor {
                name: name.into(),
                schema: Schema::default(),
                associations: Vec::new(),
                scopes: BTreeMap::new(),
                validators: Vec::new(),
                deactivation: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Associations in declaration order.
    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    pub fn association(&self, name: &str) -> Result<&Association> {
        self.associations
            .iter()
            .find(|association| association.name() == name)
            .ok_or_else(|| DbError::AssociationNotFound {
                model: self.name.clone(),
                association: name.to_string(),
            })
    }

    pub fn named_scope(&self, name: &str) -> Result<&Filter> {
        self.scopes.get(name).ok_or_else(|| DbError::ScopeNotFound {
            model: self.name.clone(),
            scope: name.to_string(),
        })
    }

    pub fn deactivation(&self) -> Option<&DeactivationConfig> {
        self.deactivation.as_ref()
    }

    pub fn is_deactivatable(&self) -> bool {
        self.deactivation.is_some()
    }

    pub fn default_visibility(&self) -> Visibility {
        if self.is_deactivatable() {
            Visibility::ActiveOnly
        } else {
            Visibility::All
        }
    }

    /// Runs every validator and reports all failures at once.
    pub fn validate(&self, record: &Record) -> Result<()> {
        let errors: Vec<String> = self
            .validators
            .iter()
            .filter_map(|(name, validator)| {
                validator(record)
                    .err()
                    .map(|message| format!("{} {}", name, message))
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DbError::ValidationFailed {
                model: self.name.clone(),
                errors,
            })
        }
    }

    /// Declares an association; redeclaring a name replaces it in place.
    pub(crate) fn add_association(&mut self, association: Association) {
        match self
            .associations
            .iter_mut()
            .find(|existing| existing.name() == association.name())
        {
            Some(existing) => *existing = association,
            None => self.associations.push(association),
        }
    }

    pub(crate) fn add_column(&mut self, column: Column) -> bool {
        self.schema.add_column(column)
    }

    pub(crate) fn set_deactivation(&mut self, config: DeactivationConfig) {
        self.deactivation = Some(config);
    }
}

pub struct ModelBuilder {
    descriptor: ModelDescriptor,
}

impl ModelBuilder {
    pub fn column(mut self, column: Column) -> Self {
        self.descriptor.add_column(column);
        self
    }

    pub fn association(mut self, association: Association) -> Self {
        self.descriptor.add_association(association);
        self
    }

    pub fn has_many(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.association(Association::has_many(name, target, foreign_key))
    }

    pub fn has_one(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.association(Association::has_one(name, target, foreign_key))
    }

    pub fn belongs_to(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.association(Association::belongs_to(name, target, foreign_key))
    }

    /// Declares a reusable filter, applied with `Query::named_scope`.
    pub fn scope(mut self, name: impl Into<String>, filter: Filter) -> Self {
        self.descriptor.scopes.insert(name.into(), filter);
        self
    }

    pub fn validate<F>(mut self, name: impl Into<String>, validator: F) -> Self
    where
        F: Fn(&Record) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.descriptor
            .validators
            .push((name.into(), Arc::new(validator)));
        self
    }

    pub fn build(self) -> ModelDescriptor {
        self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, Value};
    use crate::model::DependentAction;

    fn items() -> ModelDescriptor {
        ModelDescriptor::builder("items")
            .column(Column::new("status", DataType::Integer))
            .has_many("deps", "deps", "item_id")
            .scope("with_scoped_status", Filter::new().eq("status", 1i64))
            .validate("status", |record| match record.get("status") {
                Value::Integer(s) if *s < 0 => Err("must not be negative".to_string()),
                _ => Ok(()),
            })
            .build()
    }

    #[test]
    fn test_lookup_errors_name_the_model() {
        let model = items();
        assert!(model.association("deps").is_ok());
        assert!(matches!(
            model.association("missing"),
            Err(DbError::AssociationNotFound { model, .. }) if model == "items"
        ));
        assert!(model.named_scope("with_scoped_status").is_ok());
        assert!(matches!(
            model.named_scope("missing"),
            Err(DbError::ScopeNotFound { .. })
        ));
    }

    #[test]
    fn test_validate_collects_messages() {
        let model = items();
        assert!(model.validate(&Record::new("items").with("status", 1i64)).is_ok());

        let err = model
            .validate(&Record::new("items").with("status", -1i64))
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::ValidationFailed { errors, .. } if errors == ["status must not be negative"]
        ));
    }

    #[test]
    fn test_redeclared_association_replaces() {
        let mut model = items();
        model.add_association(
            Association::has_many("deps", "deps", "item_id").dependent(DependentAction::Destroy),
        );
        assert_eq!(model.associations().len(), 1);
        assert_eq!(
            model.association("deps").unwrap().dependent_action(),
            Some(DependentAction::Destroy)
        );
    }

    #[test]
    fn test_plain_model_sees_everything() {
        let model = items();
        assert!(!model.is_deactivatable());
        assert_eq!(model.default_visibility(), Visibility::All);
    }
}
