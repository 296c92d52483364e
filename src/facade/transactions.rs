use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::composer::StatementComposer;
use crate::core::{Bindings, Result};
use crate::interface::{Database, Transaction};

/// The batch-backed transaction handle returned by
/// [`Database::begin_tx`].
///
/// Statement calls only enqueue into an internal [`StatementComposer`];
/// nothing reaches the store before [`commit`](Transaction::commit), which
/// sends the whole block as one request. [`rollback`](Transaction::rollback)
/// (or simply dropping the handle) discards the queue with zero effect on
/// the store, because nothing was ever sent.
pub struct BatchTransaction<'a> {
    db: &'a dyn Database,
    composer: StatementComposer,
}

impl<'a> BatchTransaction<'a> {
    pub(crate) fn new(db: &'a dyn Database) -> Self {
        Self {
            db,
            composer: StatementComposer::new(),
        }
    }
}

#[async_trait]
impl Transaction for BatchTransaction<'_> {
    fn query(&mut self, query: &str, bindings: Bindings) -> BTreeMap<String, String> {
        self.composer.add(query, bindings)
    }

    fn query_one(&mut self, query: &str, bindings: Bindings) -> BTreeMap<String, String> {
        self.composer.add(query, bindings)
    }

    fn execute(&mut self, query: &str, bindings: Bindings) -> BTreeMap<String, String> {
        self.composer.add(query, bindings)
    }

    fn len(&self) -> usize {
        self.composer.len()
    }

    async fn commit(self) -> Result<()> {
        if self.composer.is_empty() {
            return Ok(());
        }
        let (text, bindings) = self.composer.build();
        self.db.execute(&text, bindings).await
    }

    fn rollback(self) {
        tracing::debug!(discarded = self.composer.len(), "batch transaction rolled back");
    }
}
