//! Typestate query builder.

pub mod markers;
pub mod query_builder;
pub mod state;

pub use self::markers::{Selected, Selection, Unselected};
pub use self::query_builder::{QueryBuilder, ResultTransform};
pub use self::state::{
    BoostFunction, DEFAULT_LIMIT, FacetSettings, MinimumMatch, PhraseBoost, QualityFilter,
    QueryState, Sort, SortDirection, SortTarget, Spatial, WeightedField,
};
