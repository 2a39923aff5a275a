//! Runtime counter storage
//!
//! The accumulated motor runtime is loaded once at startup and saved on every
//! ON to OFF transition, on the periodic checkpoint and at shutdown.

pub mod persistence;
mod sled_store;

pub use persistence::{InMemoryRuntimeStore, PersistenceError, RuntimeStore};
pub use sled_store::{SledRuntimeStore, RUNTIME_KEY};
