//! Transport seams and client handles.
//!
//! Transports own the network: connection pooling, authentication and any
//! retry policy live behind these traits. The executor calls `search` once
//! per logical query.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::compile::flat::FlatQuery;
use crate::compile::structured::StructuredQuery;
use crate::error::Result;

/// Sends key/value parameters, form-encoded, to the flat backend.
#[async_trait]
pub trait FlatTransport: Send + Sync {
    /// Run a query and return the raw JSON response body.
    ///
    /// Non-2xx answers must be reported as
    /// [`SkewerError::Transport`](crate::error::SkewerError::Transport).
    async fn search(&self, index: &str, query: &FlatQuery, timeout: Duration) -> Result<String>;
}

/// Sends a request body to the structured backend.
#[async_trait]
pub trait StructuredTransport: Send + Sync {
    /// Run a query and return the decoded JSON response.
    async fn search(
        &self,
        index: &str,
        query: &StructuredQuery,
        timeout: Duration,
    ) -> Result<Value>;
}

/// A client created on first use and owned by whoever holds the handle.
///
/// Concurrent first calls run the initializer once; the others wait for it.
/// A failed initialization leaves the handle empty so the next call retries.
#[derive(Debug)]
pub struct ClientHandle<C> {
    client: OnceCell<C>,
}

impl<C> Default for ClientHandle<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ClientHandle<C> {
    /// Create an empty handle.
    pub fn new() -> Self {
        ClientHandle {
            client: OnceCell::new(),
        }
    }

    /// Create a handle around an existing client.
    pub fn with_client(client: C) -> Self {
        ClientHandle {
            client: OnceCell::new_with(Some(client)),
        }
    }

    /// Get the client, creating it with `init` if needed.
    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<&C>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C>>,
    {
        self.client.get_or_try_init(init).await
    }

    /// Get the client if it has been created.
    pub fn get(&self) -> Option<&C> {
        self.client.get()
    }

    /// Whether the client has been created.
    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }
}
