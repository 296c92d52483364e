use crate::composer::StatementComposer;
use crate::core::{Bindings, Result};
use crate::interface::Database;

/// Fluent wrapper over [`StatementComposer`] for the common
/// "N statements, one request" case.
///
/// # Examples
///
/// ```no_run
/// # async fn demo(db: &dyn flexstore::Database) -> flexstore::Result<()> {
/// use flexstore::{bindings, AtomicBatch};
///
/// AtomicBatch::new()
///     .add("CREATE user SET email = $email", bindings! { "email" => "a@x.com" })
///     .add("CREATE profile SET email = $email", bindings! { "email" => "a@x.com" })
///     .execute(db)
///     .await
/// # }
/// ```
#[derive(Default)]
pub struct AtomicBatch {
    composer: StatementComposer,
}

impl AtomicBatch {
    pub fn new() -> Self {
        Self {
            composer: StatementComposer::new(),
        }
    }

    /// Append a parameterized statement. Chainable.
    #[must_use]
    pub fn add(mut self, query: &str, vars: Bindings) -> Self {
        self.composer.add(query, vars);
        self
    }

    /// Append a statement with no parameters. Chainable.
    #[must_use]
    pub fn add_raw(mut self, query: &str) -> Self {
        self.composer.add_raw(query);
        self
    }

    /// Count of pending statements, for assertions and logging.
    pub fn len(&self) -> usize {
        self.composer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.composer.is_empty()
    }

    /// Send the whole batch as a single request.
    ///
    /// Zero statements succeed trivially without contacting the store. A
    /// non-empty batch is all-or-nothing by construction, so any failure
    /// surfaces unchanged with no partial state to clean up.
    pub async fn execute(self, db: &dyn Database) -> Result<()> {
        if self.composer.is_empty() {
            return Ok(());
        }

        let count = self.composer.len();
        let (text, bindings) = self.composer.build();
        tracing::debug!(statements = count, "executing atomic batch");
        db.execute(&text, bindings).await
    }
}
