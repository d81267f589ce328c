//! Error types for the Skewer library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`SkewerError`] enum. Builder misuse never shows up here: illegal call
//! sequences are rejected by the type checker before a query can be compiled.
//!
//! # Examples
//!
//! ```
//! use skewer::error::{Result, SkewerError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(SkewerError::not_implemented("sort by phrase"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

/// The main error type for Skewer operations.
///
/// Compilation, transport and parse failures are kept apart so callers can
/// tell "the query failed" from "the query matched nothing".
#[derive(Error, Debug)]
pub enum SkewerError {
    /// Query-related errors (malformed clauses, unsupported combinations).
    #[error("Query error: {0}")]
    Query(String),

    /// Schema-related errors.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Invalid executor or backend configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The compiler was asked for something it cannot express.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// The backend answered with a failure, or could not be reached.
    #[error("Transport error (status {status:?}): {reason} [query: {query}]")]
    Transport {
        /// HTTP status code, if the backend answered at all.
        status: Option<u16>,
        /// Reason phrase or transport-level message.
        reason: String,
        /// Rendered query that produced the failure.
        query: String,
    },

    /// The backend answered but the body could not be understood.
    #[error("Parse error: {message} [query: {query}] [body: {body}]")]
    Parse {
        /// What went wrong.
        message: String,
        /// The raw response body.
        body: String,
        /// Rendered query that produced the response.
        query: String,
    },

    /// The caller-supplied timeout elapsed before the backend answered.
    #[error("Timeout after {elapsed_ms}ms [query: {query}]")]
    Timeout {
        /// Time spent waiting, in milliseconds.
        elapsed_ms: u64,
        /// Rendered query that timed out.
        query: String,
    },

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error, mostly raised by transport implementations.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with SkewerError.
pub type Result<T> = std::result::Result<T, SkewerError>;

impl SkewerError {
    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        SkewerError::Query(msg.into())
    }

    /// Create a new schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        SkewerError::Schema(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        SkewerError::Config(msg.into())
    }

    /// Create a new not implemented error.
    pub fn not_implemented<S: Into<String>>(msg: S) -> Self {
        SkewerError::NotImplemented(msg.into())
    }

    /// Create a new transport error.
    pub fn transport<R, Q>(status: Option<u16>, reason: R, query: Q) -> Self
    where
        R: Into<String>,
        Q: Into<String>,
    {
        SkewerError::Transport {
            status,
            reason: reason.into(),
            query: query.into(),
        }
    }

    /// Create a new parse error.
    pub fn parse<M, B, Q>(message: M, body: B, query: Q) -> Self
    where
        M: Into<String>,
        B: Into<String>,
        Q: Into<String>,
    {
        SkewerError::Parse {
            message: message.into(),
            body: body.into(),
            query: query.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<Q: Into<String>>(elapsed: std::time::Duration, query: Q) -> Self {
        SkewerError::Timeout {
            elapsed_ms: elapsed.as_millis() as u64,
            query: query.into(),
        }
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SkewerError::Other(msg.into())
    }

    /// Whether this error came from the backend round trip rather than from
    /// building or compiling the query.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            SkewerError::Transport { .. }
                | SkewerError::Parse { .. }
                | SkewerError::Timeout { .. }
        )
    }
}
