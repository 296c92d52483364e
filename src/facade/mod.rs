pub mod database;
pub mod transactions;

pub use database::Datastore;
pub use transactions::BatchTransaction;
