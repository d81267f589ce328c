//! Runs built queries against a backend.

use std::time::{Duration, Instant};

use futures::future::try_join_all;

use crate::builder::markers::{Selection, Unselected};
use crate::builder::query_builder::QueryBuilder;
use crate::builder::state::QueryState;
use crate::error::{Result, SkewerError};
use crate::executor::backend::Backend;
use crate::executor::config::ExecutorConfig;
use crate::executor::logger::{QueryEvent, QueryLogger, TracingLogger};
use crate::result::document::{RawDocument, SearchResults};
use crate::result::processor::{Response, process_results};

/// Compiles, sends and processes queries.
///
/// The executor never retries. A failure from the transport, the parser or
/// the timeout is returned as is, and an empty result is a successful
/// response with no documents.
#[derive(Debug)]
pub struct Executor<B, L = TracingLogger> {
    backend: B,
    logger: L,
    config: ExecutorConfig,
}

impl<B: Backend> Executor<B> {
    /// Create an executor with the default configuration.
    pub fn new(backend: B) -> Self {
        Executor {
            backend,
            logger: TracingLogger::default(),
            config: ExecutorConfig::default(),
        }
    }

    /// Create an executor with a validated configuration.
    pub fn with_config(backend: B, config: ExecutorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Executor {
            backend,
            logger: TracingLogger::new(&config),
            config,
        })
    }
}

impl<B: Backend, L: QueryLogger> Executor<B, L> {
    /// Replace the logger.
    pub fn with_logger<L2: QueryLogger>(self, logger: L2) -> Executor<B, L2> {
        Executor {
            backend: self.backend,
            logger,
            config: self.config,
        }
    }

    /// Get the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get the logger.
    pub fn logger(&self) -> &L {
        &self.logger
    }

    /// Get the configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    async fn run<T, F>(
        &self,
        state: &QueryState,
        timeout: Option<Duration>,
        process: F,
    ) -> Result<Response<T>>
    where
        F: FnOnce(SearchResults) -> Result<Response<T>>,
    {
        // Compilation errors surface before anything is sent or logged.
        let query = self.backend.compile(state)?;
        let rendered = query.to_string();
        let event = QueryEvent {
            backend: self.backend.name(),
            index: &state.index,
            query: &rendered,
        };
        let timeout = timeout.unwrap_or_else(|| self.config.timeout());

        self.logger.on_start(&event);
        let started = Instant::now();
        let fetched =
            tokio::time::timeout(timeout, self.backend.fetch(&state.index, &query, timeout)).await;
        let outcome = match fetched {
            Ok(results) => results.and_then(process),
            Err(_) => Err(SkewerError::timeout(started.elapsed(), rendered.as_str())),
        };

        let elapsed = started.elapsed();
        match &outcome {
            Ok(response) => {
                self.logger
                    .on_success(&event, elapsed, response.total_found(), response.len())
            }
            Err(error) => self.logger.on_failure(&event, elapsed, error),
        }
        outcome
    }

    /// Run a built query. `timeout` overrides the configured default.
    pub async fn execute<Ord, Lim, MM, Sel, Hl, QF, FL>(
        &self,
        query: &QueryBuilder<Ord, Lim, MM, Sel, Hl, QF, FL>,
        timeout: Option<Duration>,
    ) -> Result<Response<Sel::Output>>
    where
        Sel: Selection,
    {
        let state = query.state();
        self.run(state, timeout, |results| {
            process_results(state, query.selection(), query.result_transform(), results)
        })
        .await
    }

    /// Run a bare query state and return raw documents.
    pub async fn execute_state(
        &self,
        state: &QueryState,
        timeout: Option<Duration>,
    ) -> Result<Response<RawDocument>> {
        self.run(state, timeout, |results| {
            process_results(state, &Unselected, None, results)
        })
        .await
    }

    /// Fetch `pages` consecutive pages of the query's limit, starting at its
    /// start offset, concurrently.
    ///
    /// Each page is an independent request. If the index changes while the
    /// pages are in flight, documents can be skipped or repeated across
    /// pages. Any failing page fails the whole call.
    pub async fn execute_pages<Ord, Lim, MM, Sel, Hl, QF, FL>(
        &self,
        query: &QueryBuilder<Ord, Lim, MM, Sel, Hl, QF, FL>,
        pages: usize,
        timeout: Option<Duration>,
    ) -> Result<Vec<Response<Sel::Output>>>
    where
        Sel: Selection,
    {
        let base = query.state();
        let states: Vec<QueryState> = (0..pages)
            .map(|page| base.page(base.start + page * base.limit, base.limit))
            .collect();

        try_join_all(states.iter().map(|state| {
            self.run(state, timeout, move |results| {
                process_results(state, query.selection(), query.result_transform(), results)
            })
        }))
        .await
    }
}
