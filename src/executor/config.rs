//! Executor configuration.
//!
//! # Examples
//!
//! ```
//! use skewer::executor::ExecutorConfig;
//!
//! let config = ExecutorConfig::default();
//! assert_eq!(config.timeout_ms, 5_000);
//!
//! let config = ExecutorConfig::from_json(r#"{"timeout_ms": 250}"#).unwrap();
//! assert_eq!(config.timeout_ms, 250);
//! assert!(config.log_query_text);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkewerError};

/// Settings for [`Executor`](crate::executor::Executor).
///
/// Missing keys take their default when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Timeout applied when the caller does not pass one, in milliseconds.
    pub timeout_ms: u64,
    /// Queries slower than this are logged at warn level, in milliseconds.
    /// Zero disables the warning.
    pub slow_query_ms: u64,
    /// Include the rendered query in log events.
    pub log_query_text: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            slow_query_ms: 1_000,
            log_query_text: true,
        }
    }
}

impl ExecutorConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ExecutorConfig = serde_json::from_str(json)
            .map_err(|e| SkewerError::invalid_config(format!("executor config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(SkewerError::invalid_config(
                "timeout_ms must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Default timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Slow query threshold, if enabled.
    pub fn slow_query(&self) -> Option<Duration> {
        (self.slow_query_ms > 0).then(|| Duration::from_millis(self.slow_query_ms))
    }
}
