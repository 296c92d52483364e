pub mod error;
pub mod observe;
pub mod types;

pub use error::{DbError, Result};
pub use observe::{CompensationObserver, TracingObserver};
pub use types::Bindings;
