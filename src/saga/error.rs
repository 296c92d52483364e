use thiserror::Error;

use crate::core::DbError;

/// A saga step failed.
///
/// Carries the failing step's name, its underlying cause, and whatever went
/// wrong during the unwind. Compensation failures are collected, never
/// allowed to replace the original cause.
#[derive(Error, Debug)]
#[error("step '{step}' failed: {source}")]
pub struct StepFailure {
    pub step: String,
    #[source]
    pub source: Box<DbError>,
    pub compensation_failures: Vec<CompensationFailure>,
}

/// One compensating action that failed during the unwind.
#[derive(Error, Debug)]
#[error("compensation for step '{step}' failed: {source}")]
pub struct CompensationFailure {
    pub step: String,
    #[source]
    pub source: Box<DbError>,
}
