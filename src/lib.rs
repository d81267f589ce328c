//! # Skewer
//!
//! Typed query construction and result ranking for full-text search
//! backends.
//!
//! ## Features
//!
//! - Closed query algebra with structural equality and hashing
//! - Typestate builder: repeated one-shot settings fail to compile
//! - Two compilers from one builder state: flat key/value parameters and a
//!   structured JSON request body
//! - Quality-decay cutoff of ranked results
//! - Async executor over pluggable transports, with timeouts and logging
//!   hooks
//!
//! ## Example
//!
//! ```
//! use skewer::prelude::*;
//!
//! let fullname = Field::text("fullname");
//! let query = QueryBuilder::new("users").where_(fullname.eqs("jon"));
//!
//! let flat = query.compile_flat().unwrap();
//! assert_eq!(flat.get("q"), Some("fullname:(\"jon\")"));
//! assert_eq!(flat.get("rows"), Some("10"));
//!
//! let structured = query.compile_structured().unwrap();
//! assert_eq!(structured.body()["size"], 10);
//! ```

pub mod builder;
pub mod compile;
pub mod error;
pub mod executor;
pub mod query;
pub mod result;
pub mod schema;

pub mod prelude {
    pub use crate::builder::{QueryBuilder, QueryState, Selection};
    pub use crate::compile::{FlatQuery, StructuredQuery};
    pub use crate::error::{Result, SkewerError};
    pub use crate::executor::{
        Backend, ClientHandle, Executor, ExecutorConfig, FlatBackend, FlatTransport, QueryLogger,
        StructuredBackend, StructuredTransport, TracingLogger,
    };
    pub use crate::query::{CellCoverer, Clause, DistanceShape, FieldClause, GeoPoint, Query};
    pub use crate::result::{RawDocument, Response, SearchResults};
    pub use crate::schema::{Field, Schema};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
