// ============================================================================
// flexstore — transaction composition for schema-flexible document stores
// ============================================================================
//
// The backing store's client protocol has no held multi-round-trip server
// transaction. This crate provides the two workarounds the persistence stack
// is built on:
//
//   * atomic batches — N parameterized statements merged (collision-free)
//     into one BEGIN/COMMIT block, sent as a single all-or-nothing request;
//   * sagas — ordered independent steps with reverse-order compensating
//     actions, approximating atomicity where one request is impossible.

pub mod composer;
pub mod connection;
pub mod core;
pub mod facade;
pub mod interface;
pub mod result;
pub mod saga;
pub mod uow;

// Re-export main types for convenience
pub use core::{Bindings, CompensationObserver, DbError, Result, TracingObserver};

pub use composer::batch::AtomicBatch;
pub use composer::StatementComposer;
pub use connection::{
    auth::Credentials, config::ConnectionConfig, mock::MockTransport, Connection, Transport,
};
pub use facade::{BatchTransaction, Datastore};
pub use interface::{Database, Transaction};
pub use result::{unmarshal, ResultEnvelope};
pub use saga::{CompensationFailure, SagaOperation, StepFailure};
pub use uow::UnitOfWork;
