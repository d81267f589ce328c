//! Query execution hooks.

use std::time::Duration;

use crate::error::SkewerError;
use crate::executor::config::ExecutorConfig;

/// What is being executed.
#[derive(Debug, Clone, Copy)]
pub struct QueryEvent<'a> {
    /// Backend name, e.g. `flat` or `structured`.
    pub backend: &'static str,
    /// Target index.
    pub index: &'a str,
    /// Rendered query.
    pub query: &'a str,
}

/// Hooks around one query execution.
///
/// For each execution `on_start` is called once, followed by exactly one of
/// `on_success` or `on_failure`.
pub trait QueryLogger: Send + Sync {
    /// The query is about to be sent.
    fn on_start(&self, _event: &QueryEvent<'_>) {}

    /// The query succeeded. `returned` counts documents after processing.
    fn on_success(
        &self,
        _event: &QueryEvent<'_>,
        _elapsed: Duration,
        _total_found: u64,
        _returned: usize,
    ) {
    }

    /// The query failed.
    fn on_failure(&self, _event: &QueryEvent<'_>, _elapsed: Duration, _error: &SkewerError) {}
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl QueryLogger for NoopLogger {}

/// Logs through `tracing` under the `skewer::executor` target.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    log_query_text: bool,
    slow_query: Option<Duration>,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new(&ExecutorConfig::default())
    }
}

impl TracingLogger {
    /// Create a logger from executor settings.
    pub fn new(config: &ExecutorConfig) -> Self {
        TracingLogger {
            log_query_text: config.log_query_text,
            slow_query: config.slow_query(),
        }
    }

    fn query_text<'a>(&self, event: &QueryEvent<'a>) -> &'a str {
        if self.log_query_text { event.query } else { "<redacted>" }
    }
}

impl QueryLogger for TracingLogger {
    fn on_start(&self, event: &QueryEvent<'_>) {
        tracing::debug!(
            target: "skewer::executor",
            backend = event.backend,
            index = event.index,
            query = self.query_text(event),
            "Executing query"
        );
    }

    fn on_success(
        &self,
        event: &QueryEvent<'_>,
        elapsed: Duration,
        total_found: u64,
        returned: usize,
    ) {
        let elapsed_ms = elapsed.as_millis() as u64;
        match self.slow_query {
            Some(threshold) if elapsed >= threshold => tracing::warn!(
                target: "skewer::executor",
                backend = event.backend,
                index = event.index,
                query = self.query_text(event),
                elapsed_ms,
                total_found,
                returned,
                "Slow query"
            ),
            _ => tracing::info!(
                target: "skewer::executor",
                backend = event.backend,
                index = event.index,
                elapsed_ms,
                total_found,
                returned,
                "Query completed"
            ),
        }
    }

    fn on_failure(&self, event: &QueryEvent<'_>, elapsed: Duration, error: &SkewerError) {
        tracing::warn!(
            target: "skewer::executor",
            backend = event.backend,
            index = event.index,
            query = self.query_text(event),
            elapsed_ms = elapsed.as_millis() as u64,
            error = %error,
            "Query failed"
        );
    }
}
