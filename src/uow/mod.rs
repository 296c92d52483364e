//! Unit of work: one composed atomic commit plus compensations for the
//! *external* side effects performed alongside it.
//!
//! The composed statements are already all-or-nothing by construction (they
//! go to the store as a single transaction block), so the compensation chain
//! never undoes statements. It exists for effects outside the store that the
//! caller performed while building the unit — an uploaded artifact, a
//! third-party call — and runs only when the commit itself fails.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::composer::StatementComposer;
use crate::core::{Bindings, CompensationObserver, Result, TracingObserver};
use crate::interface::Database;

type CompensateFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;

/// A [`StatementComposer`] with an ordered chain of compensating actions.
///
/// Compensations run in reverse registration order, each failure reported to
/// the observer individually without stopping the chain, and the original
/// commit error is returned unchanged.
pub struct UnitOfWork {
    composer: StatementComposer,
    compensations: Vec<(String, CompensateFn)>,
    observer: Arc<dyn CompensationObserver>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::with_observer(Arc::new(TracingObserver))
    }

    /// Create a unit of work that reports compensation failures to
    /// `observer` instead of the default tracing sink.
    pub fn with_observer(observer: Arc<dyn CompensationObserver>) -> Self {
        Self {
            composer: StatementComposer::new(),
            compensations: Vec::new(),
            observer,
        }
    }

    /// Append a parameterized statement to the composed commit.
    ///
    /// Returns the placeholder rename map, as
    /// [`StatementComposer::add`] does.
    pub fn add(&mut self, query: &str, vars: Bindings) -> BTreeMap<String, String> {
        self.composer.add(query, vars)
    }

    /// Append a statement with no parameters.
    pub fn add_raw(&mut self, query: &str) {
        self.composer.add_raw(query);
    }

    /// Append a statement and register a compensation for the external side
    /// effect tied to it.
    ///
    /// The most recently registered compensation runs first if the commit
    /// fails.
    pub fn add_with_rollback<C, Fut>(
        &mut self,
        query: &str,
        vars: Bindings,
        compensate: C,
    ) -> BTreeMap<String, String>
    where
        C: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let renames = self.composer.add(query, vars);
        self.register_rollback(compensate);
        renames
    }

    /// Register a compensation not tied to any statement.
    pub fn register_rollback<C, Fut>(&mut self, compensate: C)
    where
        C: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let label = format!("rollback#{}", self.compensations.len() + 1);
        self.compensations
            .push((label, Box::new(move || compensate().boxed())));
    }

    /// Number of composed statements.
    pub fn len(&self) -> usize {
        self.composer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.composer.is_empty()
    }

    /// Send the single composed request.
    ///
    /// Success never touches the compensations. Failure runs the full chain
    /// in reverse registration order — each failure reported individually,
    /// never propagated — and then returns the original commit error
    /// unchanged. An empty unit commits trivially without contacting the
    /// store.
    pub async fn commit(self, db: &dyn Database) -> Result<()> {
        let Self {
            composer,
            compensations,
            observer,
        } = self;

        if composer.is_empty() {
            return Ok(());
        }

        let (text, bindings) = composer.build();
        match db.execute(&text, bindings).await {
            Ok(()) => Ok(()),
            Err(commit_err) => {
                tracing::debug!(%commit_err, "commit failed, running compensations");
                for (label, compensate) in compensations.into_iter().rev() {
                    if let Err(comp_err) = compensate().await {
                        observer.compensation_failed(&label, &comp_err);
                    }
                }
                Err(commit_err)
            }
        }
    }
}

impl Default for UnitOfWork {
    fn default() -> Self {
        Self::new()
    }
}
