use super::Record;
use crate::core::{ID_COLUMN, RowId};
use crate::query::Query;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssociationKind {
    /// Foreign key on the target, many targets per owner
    HasMany,
    /// Foreign key on the target, at most one target per owner
    HasOne,
    /// Foreign key on the owner
    BelongsTo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    Single,
    Many,
}

/// What deleting the owner does to the associated rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependentAction {
    Destroy,
    DeleteAll,
    Nullify,
}

impl DependentAction {
    /// `Destroy` and `DeleteAll` remove the dependents along with the owner.
    pub fn is_destructive(self) -> bool {
        matches!(self, DependentAction::Destroy | DependentAction::DeleteAll)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    name: String,
    kind: AssociationKind,
    target: String,
    foreign_key: String,
    dependent: Option<DependentAction>,
}

impl Association {
    pub fn new(
        name: impl Into<String>,
        kind: AssociationKind,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            target: target.into(),
            foreign_key: foreign_key.into(),
            dependent: None,
        }
    }

    pub fn has_many(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(name, AssociationKind::HasMany, target, foreign_key)
    }

    pub fn has_one(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(name, AssociationKind::HasOne, target, foreign_key)
    }

    pub fn belongs_to(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(name, AssociationKind::BelongsTo, target, foreign_key)
    }

    pub fn dependent(mut self, action: DependentAction) -> Self {
        self.dependent = Some(action);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AssociationKind {
        self.kind
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    pub fn dependent_action(&self) -> Option<DependentAction> {
        self.dependent
    }

    pub fn cardinality(&self) -> Cardinality {
        match self.kind {
            AssociationKind::HasMany => Cardinality::Many,
            AssociationKind::HasOne | AssociationKind::BelongsTo => Cardinality::Single,
        }
    }

    /// The query that loads the associated rows of `owner`, or `None` when
    /// there is nothing to load: an unsaved owner of a has-many/has-one, or a
    /// NULL foreign key on a belongs-to.
    ///
    /// A has-one or belongs-to loads the lowest-id match. Under a lifted
    /// visibility scope that row may be inactive even when an active one exists.
    pub fn scope_for(&self, owner: &Record) -> Option<Query> {
        let query = match self.kind {
            AssociationKind::HasMany | AssociationKind::HasOne => {
                Query::new(&self.target).filter(&self.foreign_key, owner.id()?)
            }
            AssociationKind::BelongsTo => {
                let key = owner.get(&self.foreign_key).as_i64()?;
                Query::new(&self.target).filter(ID_COLUMN, key)
            }
        };

        Some(match self.cardinality() {
            Cardinality::Single => query.limit(1),
            Cardinality::Many => query,
        })
    }

    /// Unsaved target record whose foreign key points at `owner`.
    /// Only meaningful for has-many/has-one on a saved owner.
    pub fn build_for(&self, owner_id: RowId) -> Record {
        Record::new(&self.target).with(&self.foreign_key, owner_id)
    }
}
