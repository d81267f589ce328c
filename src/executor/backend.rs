//! Backends: a compiler paired with a transport and a response parser.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::builder::state::QueryState;
use crate::compile::flat::{self, FlatQuery};
use crate::compile::structured::{self, StructuredQuery};
use crate::error::Result;
use crate::executor::transport::{FlatTransport, StructuredTransport};
use crate::result::document::SearchResults;
use crate::result::parse;

/// Compiles a query state and fetches its results.
#[async_trait]
pub trait Backend: Send + Sync {
    /// The compiled request. Its `Display` form is what errors and logs carry.
    type Query: fmt::Display + Send + Sync;

    /// Short name used in log events.
    fn name(&self) -> &'static str;

    /// Compile a query state.
    fn compile(&self, state: &QueryState) -> Result<Self::Query>;

    /// Send a compiled query and parse the response.
    async fn fetch(
        &self,
        index: &str,
        query: &Self::Query,
        timeout: Duration,
    ) -> Result<SearchResults>;
}

/// The key/value parameter backend.
#[derive(Debug, Clone)]
pub struct FlatBackend<T> {
    transport: T,
}

impl<T: FlatTransport> FlatBackend<T> {
    /// Wrap a transport.
    pub fn new(transport: T) -> Self {
        FlatBackend { transport }
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: FlatTransport> Backend for FlatBackend<T> {
    type Query = FlatQuery;

    fn name(&self) -> &'static str {
        "flat"
    }

    fn compile(&self, state: &QueryState) -> Result<FlatQuery> {
        flat::compile(state)
    }

    async fn fetch(
        &self,
        index: &str,
        query: &FlatQuery,
        timeout: Duration,
    ) -> Result<SearchResults> {
        let body = self.transport.search(index, query, timeout).await?;
        parse::parse_flat(&body, &query.to_string())
    }
}

/// The structured query-object backend.
#[derive(Debug, Clone)]
pub struct StructuredBackend<T> {
    transport: T,
}

impl<T: StructuredTransport> StructuredBackend<T> {
    /// Wrap a transport.
    pub fn new(transport: T) -> Self {
        StructuredBackend { transport }
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: StructuredTransport> Backend for StructuredBackend<T> {
    type Query = StructuredQuery;

    fn name(&self) -> &'static str {
        "structured"
    }

    fn compile(&self, state: &QueryState) -> Result<StructuredQuery> {
        structured::compile(state)
    }

    async fn fetch(
        &self,
        index: &str,
        query: &StructuredQuery,
        timeout: Duration,
    ) -> Result<SearchResults> {
        let body = self.transport.search(index, query, timeout).await?;
        let start = query.body()["from"].as_u64().unwrap_or(0) as usize;
        parse::parse_structured(&body, start, &query.to_string())
    }
}
