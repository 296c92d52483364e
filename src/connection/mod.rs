//! The connection boundary: sign-in, namespace selection, and the single
//! primitive that sends one query string with bound parameters.
//!
//! The actual driver lives outside this crate behind the [`Transport`]
//! trait; [`Connection`] adds connection state, per-query timeouts, and the
//! one-time decode of raw wire values into [`ResultEnvelope`]s.

pub mod auth;
pub mod config;
pub mod mock;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::{Bindings, DbError, Result};
use crate::result::ResultEnvelope;
use auth::Credentials;

/// The raw driver seam.
///
/// One implementation per backing store protocol. `send` submits one query
/// string (possibly a multi-statement transaction block) with its bindings
/// and returns the raw per-statement wire values.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn signin(&self, credentials: &Credentials) -> Result<()>;

    async fn use_ns(&self, namespace: &str, database: &str) -> Result<()>;

    async fn send(&self, query: &str, bindings: &Bindings) -> Result<Vec<Value>>;

    /// Server version string, doubling as the health probe.
    async fn version(&self) -> Result<String>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn signin(&self, credentials: &Credentials) -> Result<()> {
        (**self).signin(credentials).await
    }

    async fn use_ns(&self, namespace: &str, database: &str) -> Result<()> {
        (**self).use_ns(namespace, database).await
    }

    async fn send(&self, query: &str, bindings: &Bindings) -> Result<Vec<Value>> {
        (**self).send(query, bindings).await
    }

    async fn version(&self) -> Result<String> {
        (**self).version().await
    }
}

/// An established connection to the document store.
///
/// Wraps a [`Transport`] with a connected/closed state machine and the
/// configured per-query timeout. All statement traffic for one store flows
/// through [`query`](Self::query), which decodes wire values into tagged
/// envelopes exactly once.
pub struct Connection {
    transport: Box<dyn Transport>,
    query_timeout: Option<Duration>,
    closed: AtomicBool,
}

impl Connection {
    pub fn new(transport: Box<dyn Transport>, query_timeout: Option<Duration>) -> Self {
        Self {
            transport,
            query_timeout,
            closed: AtomicBool::new(false),
        }
    }

    /// Sign in with root credentials.
    pub async fn signin(&self, credentials: &Credentials) -> Result<()> {
        self.guard_open()?;
        self.transport
            .signin(credentials)
            .await
            .map_err(|err| DbError::Connection(format!("sign-in failed: {err}")))?;
        tracing::debug!(user = %credentials.username, "signed in");
        Ok(())
    }

    /// Select the namespace and database for this connection.
    pub async fn use_ns(&self, namespace: &str, database: &str) -> Result<()> {
        self.guard_open()?;
        self.transport
            .use_ns(namespace, database)
            .await
            .map_err(|err| {
                DbError::Connection(format!("selecting {namespace}/{database} failed: {err}"))
            })?;
        tracing::debug!(namespace, database, "namespace selected");
        Ok(())
    }

    /// Send one query string with bound parameters.
    ///
    /// Returns one decoded envelope per statement. Respects the configured
    /// query timeout; an elapsed timeout is a
    /// [`DbError::Cancelled`], not a query error.
    pub async fn query(&self, query: &str, bindings: &Bindings) -> Result<Vec<ResultEnvelope>> {
        self.guard_open()?;
        let raw = self.bounded(self.transport.send(query, bindings)).await?;
        Ok(ResultEnvelope::decode_all(raw))
    }

    /// Fetch the server version string.
    pub async fn version(&self) -> Result<String> {
        self.guard_open()?;
        self.bounded(self.transport.version()).await
    }

    /// Health check. Fails when the connection is closed or the server is
    /// unreachable.
    pub async fn ping(&self) -> Result<()> {
        self.version().await.map(|_| ())
    }

    /// Close the connection. Subsequent calls fail with a connection error.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        tracing::debug!("connection closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn guard_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(DbError::Connection("connection is closed".to_string()));
        }
        Ok(())
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match self.query_timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(outcome) => outcome,
                Err(_) => Err(DbError::Cancelled(format!(
                    "query exceeded the {limit:?} timeout"
                ))),
            },
            None => fut.await,
        }
    }
}
