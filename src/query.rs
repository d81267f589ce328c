//! Query algebra: expressions, clauses and escaping.

pub mod clause;
pub mod escape;
pub mod expr;
pub mod geo;

pub use self::clause::{Clause, FieldClause};
pub use self::expr::{DistanceShape, Query, Scalar};
pub use self::geo::{CellCoverer, GeoPoint};
