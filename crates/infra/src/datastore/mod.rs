//! Record store abstraction and implementations.

mod in_memory;
mod r#trait;

pub use in_memory::InMemoryDatastore;
pub use r#trait::{Datastore, StoreError};
