use thiserror::Error;

use crate::saga::StepFailure;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Result limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error(transparent)]
    Step(#[from] StepFailure),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    /// True for errors that signal "zero rows where one was expected".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True for cancellation/timeout, as opposed to a store-reported failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}
