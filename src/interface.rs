use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::{Bindings, Result};
use crate::facade::transactions::BatchTransaction;

/// The statement-execution contract higher layers depend on.
///
/// Implemented by [`Datastore`](crate::facade::Datastore) over a live
/// connection; test code can substitute its own implementation to observe
/// exactly what would be sent to the store.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute a parameterized query and return every normalized result.
    async fn query(&self, query: &str, bindings: Bindings) -> Result<Vec<Value>>;

    /// Execute a parameterized query expected to return a single value.
    ///
    /// Zero rows surface as [`DbError::NotFound`](crate::DbError::NotFound).
    async fn query_one(&self, query: &str, bindings: Bindings) -> Result<Value>;

    /// Execute a parameterized statement, discarding any result values.
    async fn execute(&self, query: &str, bindings: Bindings) -> Result<()>;

    /// Check the connection is alive.
    async fn ping(&self) -> Result<()>;

    /// Begin a batch-backed transaction.
    ///
    /// The returned handle only enqueues statements; nothing reaches the
    /// store until [`Transaction::commit`]. This is a deliberate
    /// simplification for a protocol with no held server-side transaction:
    /// callers must not expect per-statement results or isolation before
    /// commit.
    fn begin_tx(&self) -> BatchTransaction<'_>
    where
        Self: Sized,
    {
        BatchTransaction::new(self)
    }
}

/// A batch-backed transaction handle.
///
/// Statement calls enqueue only and return the placeholder rename map (see
/// [`StatementComposer::add`](crate::StatementComposer::add)); `commit` sends
/// the single composed request; `rollback` discards the queue with zero
/// effect on the store.
#[async_trait]
pub trait Transaction: Send {
    /// Enqueue a query statement.
    fn query(&mut self, query: &str, bindings: Bindings) -> BTreeMap<String, String>;

    /// Enqueue a query statement expected to produce one row.
    ///
    /// Identical to [`query`](Self::query) here: results only exist after
    /// commit, and the committed block reports a single combined outcome.
    fn query_one(&mut self, query: &str, bindings: Bindings) -> BTreeMap<String, String>;

    /// Enqueue a statement executed for effect.
    fn execute(&mut self, query: &str, bindings: Bindings) -> BTreeMap<String, String>;

    /// Number of statements enqueued so far.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Send the composed block as one request. Empty queue commits trivially.
    async fn commit(self) -> Result<()>;

    /// Discard the queue. Nothing was sent, so nothing is undone.
    fn rollback(self);
}
