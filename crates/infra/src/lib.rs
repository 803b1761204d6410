//! Infrastructure: the record store and the stock ledger built on top of it.
//!
//! Domain crates stay pure; everything that reads or writes persisted state
//! goes through here. The store is always an explicitly passed handle, never
//! a process-wide global, so the ledger is testable in isolation.

pub mod datastore;
pub mod stock_ledger;

pub use datastore::{Datastore, InMemoryDatastore, StoreError};
pub use stock_ledger::{OrderChange, StockLedger};
