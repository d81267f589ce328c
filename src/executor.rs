//! Query execution: compile, send, parse and process.
//!
//! The executor is the only asynchronous part of the crate. Everything it
//! calls before the transport is synchronous and pure.

pub mod backend;
pub mod config;
#[allow(clippy::module_inception)]
pub mod executor;
pub mod logger;
pub mod transport;

pub use self::backend::{Backend, FlatBackend, StructuredBackend};
pub use self::config::ExecutorConfig;
pub use self::executor::Executor;
pub use self::logger::{NoopLogger, QueryEvent, QueryLogger, TracingLogger};
pub use self::transport::{ClientHandle, FlatTransport, StructuredTransport};
