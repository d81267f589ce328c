//! Compilers from builder state to backend requests.
//!
//! Both compilers are pure functions of [`QueryState`](crate::builder::QueryState):
//! the same state always produces the same request.

pub mod flat;
pub mod script;
pub mod structured;

pub use self::flat::{FlatQuery, render_clause, render_query};
pub use self::script::ScriptBuilder;
pub use self::structured::StructuredQuery;
