//! Sequential sagas: independent steps with reverse-order compensation.
//!
//! Used where statements cannot share one atomic batch, e.g. when a step's
//! outcome decides the next step, or a step is not a store statement at all.
//! Atomicity is approximated, not guaranteed: a crash between a step's
//! execution and the unwind leaves a partially-applied state, and a network
//! failure after a statement reaches the store is indistinguishable from
//! outright failure. Compensations must therefore be safe to invoke against
//! an unknown actually-applied state; that is the caller's contract.

mod error;

pub use error::{CompensationFailure, StepFailure};

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::core::{CompensationObserver, Result, TracingObserver};

type StepFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;

struct SagaStep {
    name: String,
    execute: StepFn,
    compensate: Option<StepFn>,
}

/// An ordered list of (execute, compensate) steps run sequentially.
///
/// On the first failing step the saga stops, runs the compensations of every
/// *previously completed* step in strict reverse order, and returns a
/// [`StepFailure`] naming the failing step. The failing step's own
/// compensation is never invoked. A compensation failure is reported to the
/// observer and collected, and the unwind continues past it.
///
/// # Examples
///
/// ```
/// # tokio_test::block_on(async {
/// use flexstore::SagaOperation;
///
/// let mut saga = SagaOperation::new();
/// saga.add_step("reserve", || async { Ok(()) });
/// saga.add_step_with_compensation(
///     "charge",
///     || async { Ok(()) },
///     || async { Ok(()) },
/// );
/// saga.execute().await.unwrap();
/// # });
/// ```
pub struct SagaOperation {
    steps: Vec<SagaStep>,
    observer: Arc<dyn CompensationObserver>,
}

impl SagaOperation {
    pub fn new() -> Self {
        Self::with_observer(Arc::new(TracingObserver))
    }

    /// Create a saga that reports compensation failures to `observer`
    /// instead of the default tracing sink.
    pub fn with_observer(observer: Arc<dyn CompensationObserver>) -> Self {
        Self {
            steps: Vec::new(),
            observer,
        }
    }

    /// Append a step with no compensating action.
    pub fn add_step<F, Fut>(&mut self, name: impl Into<String>, execute: F) -> &mut Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.steps.push(SagaStep {
            name: name.into(),
            execute: Box::new(move || execute().boxed()),
            compensate: None,
        });
        self
    }

    /// Append a step whose effect `compensate` can semantically undo.
    pub fn add_step_with_compensation<F, Fut, C, CFut>(
        &mut self,
        name: impl Into<String>,
        execute: F,
        compensate: C,
    ) -> &mut Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
        C: FnOnce() -> CFut + Send + 'static,
        CFut: Future<Output = Result<()>> + Send + 'static,
    {
        self.steps.push(SagaStep {
            name: name.into(),
            execute: Box::new(move || execute().boxed()),
            compensate: Some(Box::new(move || compensate().boxed())),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run the steps in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`StepFailure`] identifying the first failing step and its
    /// cause, with any compensation failures collected alongside.
    pub async fn execute(self) -> std::result::Result<(), StepFailure> {
        let mut completed: Vec<(String, Option<StepFn>)> = Vec::new();

        for step in self.steps {
            tracing::debug!(step = %step.name, "executing saga step");
            match (step.execute)().await {
                Ok(()) => completed.push((step.name, step.compensate)),
                Err(source) => {
                    tracing::debug!(step = %step.name, %source, "saga step failed, unwinding");
                    let compensation_failures =
                        Self::unwind(completed, self.observer.as_ref()).await;
                    return Err(StepFailure {
                        step: step.name,
                        source: Box::new(source),
                        compensation_failures,
                    });
                }
            }
        }

        Ok(())
    }

    async fn unwind(
        completed: Vec<(String, Option<StepFn>)>,
        observer: &dyn CompensationObserver,
    ) -> Vec<CompensationFailure> {
        let mut failures = Vec::new();

        for (name, compensate) in completed.into_iter().rev() {
            let Some(compensate) = compensate else {
                continue;
            };
            if let Err(source) = compensate().await {
                observer.compensation_failed(&name, &source);
                failures.push(CompensationFailure {
                    step: name,
                    source: Box::new(source),
                });
            }
        }

        failures
    }
}

impl Default for SagaOperation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::core::DbError;

    /// Observer that records failing step names for assertions.
    #[derive(Default)]
    struct RecordingObserver {
        failed: Mutex<Vec<String>>,
    }

    impl CompensationObserver for RecordingObserver {
        fn compensation_failed(&self, step: &str, _error: &DbError) {
            self.failed.lock().unwrap().push(step.to_string());
        }
    }

    fn log_entry(log: &Arc<Mutex<Vec<String>>>, entry: &str) {
        log.lock().unwrap().push(entry.to_string());
    }

    #[tokio::test]
    async fn all_steps_run_in_order_on_success() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut saga = SagaOperation::new();

        for name in ["a", "b", "c"] {
            let log = Arc::clone(&log);
            saga.add_step(name, move || async move {
                log_entry(&log, name);
                Ok(())
            });
        }

        saga.execute().await.unwrap();
        assert_eq!(*log.lock().unwrap(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn failure_compensates_completed_steps_in_reverse() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut saga = SagaOperation::new();

        for name in ["a", "b"] {
            let exec_log = Arc::clone(&log);
            let comp_log = Arc::clone(&log);
            saga.add_step_with_compensation(
                name,
                move || async move {
                    log_entry(&exec_log, &format!("exec {name}"));
                    Ok(())
                },
                move || async move {
                    log_entry(&comp_log, &format!("undo {name}"));
                    Ok(())
                },
            );
        }

        let comp_log = Arc::clone(&log);
        saga.add_step_with_compensation(
            "c",
            || async { Err(DbError::Query("boom".to_string())) },
            move || async move {
                log_entry(&comp_log, "undo c");
                Ok(())
            },
        );

        let failure = saga.execute().await.unwrap_err();
        assert_eq!(failure.step, "c");
        assert!(matches!(*failure.source, DbError::Query(_)));
        assert!(failure.compensation_failures.is_empty());

        // Failing step's own compensation never runs; the rest unwind LIFO.
        assert_eq!(
            *log.lock().unwrap(),
            ["exec a", "exec b", "undo b", "undo a"]
        );
    }

    #[tokio::test]
    async fn compensation_failure_does_not_stop_the_unwind() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let observer = Arc::new(RecordingObserver::default());
        let mut saga = SagaOperation::with_observer(Arc::clone(&observer) as _);

        let comp_log = Arc::clone(&log);
        saga.add_step_with_compensation(
            "a",
            || async { Ok(()) },
            move || async move {
                log_entry(&comp_log, "undo a");
                Ok(())
            },
        );
        saga.add_step_with_compensation(
            "b",
            || async { Ok(()) },
            || async { Err(DbError::Query("undo b broke".to_string())) },
        );
        saga.add_step("c", || async { Err(DbError::Query("boom".to_string())) });

        let failure = saga.execute().await.unwrap_err();
        assert_eq!(failure.step, "c");
        assert_eq!(failure.compensation_failures.len(), 1);
        assert_eq!(failure.compensation_failures[0].step, "b");

        // a's compensation still ran after b's failed.
        assert_eq!(*log.lock().unwrap(), ["undo a"]);
        assert_eq!(*observer.failed.lock().unwrap(), ["b"]);
    }

    #[tokio::test]
    async fn steps_without_compensation_are_skipped_during_unwind() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut saga = SagaOperation::new();

        let comp_log = Arc::clone(&log);
        saga.add_step_with_compensation(
            "a",
            || async { Ok(()) },
            move || async move {
                log_entry(&comp_log, "undo a");
                Ok(())
            },
        );
        saga.add_step("read_only", || async { Ok(()) });
        saga.add_step("c", || async { Err(DbError::Query("boom".to_string())) });

        let failure = saga.execute().await.unwrap_err();
        assert_eq!(failure.step, "c");
        assert_eq!(*log.lock().unwrap(), ["undo a"]);
    }

    #[tokio::test]
    async fn first_step_failure_needs_no_compensation() {
        let mut saga = SagaOperation::new();
        saga.add_step("a", || async { Err(DbError::Connection("down".to_string())) });

        let failure = saga.execute().await.unwrap_err();
        assert_eq!(failure.step, "a");
        assert!(failure.compensation_failures.is_empty());
    }

    #[tokio::test]
    async fn empty_saga_succeeds() {
        assert!(SagaOperation::new().execute().await.is_ok());
    }

    #[test]
    fn step_failure_converts_into_db_error() {
        let failure = StepFailure {
            step: "charge".to_string(),
            source: Box::new(DbError::Query("declined".to_string())),
            compensation_failures: Vec::new(),
        };
        let err: DbError = failure.into();
        assert!(err.to_string().contains("charge"));
    }
}
