// ============================================================================
// Models
// ============================================================================
//
// Descriptors say what a model looks like: columns, associations, named
// scopes, validators and, once adopted, its deactivation configuration.
// Records are the in-memory rows that flow through the facade.
//
// ============================================================================

pub mod association;
pub mod descriptor;
pub mod record;
pub mod registry;

pub use association::{Association, AssociationKind, Cardinality, DependentAction};
pub use descriptor::{ModelBuilder, ModelDescriptor, Validator};
pub use record::Record;
pub use registry::ModelRegistry;
