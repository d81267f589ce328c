//! Schema module for Skewer.
//!
//! Field descriptors, the typed handles that turn values into clauses, and
//! the schema that ties fields to an index.

pub mod field;
#[allow(clippy::module_inception)]
pub mod schema;
pub mod value;

pub use field::{Field, FieldDescriptor, FieldKind};
pub use schema::Schema;
pub use value::QueryValue;
