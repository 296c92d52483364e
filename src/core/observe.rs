use crate::core::DbError;

/// Sink for compensation failures.
///
/// Compensation runs after something already went wrong, so its own failures
/// must never replace the original error. They are handed to this observer
/// instead, one call per failed action, and the unwind keeps going.
pub trait CompensationObserver: Send + Sync {
    fn compensation_failed(&self, step: &str, error: &DbError);
}

/// Default observer: routes every failure through `tracing::warn!`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl CompensationObserver for TracingObserver {
    fn compensation_failed(&self, step: &str, error: &DbError) {
        tracing::warn!(step, %error, "compensation failed");
    }
}
