//! Key/value persistence consumed by the engine.
//!
//! The engine only needs string get/set under a fixed key, so any backend
//! able to do that can host the configuration.

mod file;
mod inmemory;

use crate::error::StoreError;

pub use file::JsonFileStore;
pub use inmemory::InMemoryStore;

/// Backend-agnostic string store.
///
/// Synchronous: engine state is mutated and persisted without
/// crossing a suspension point.
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, or `default` when absent.
    fn get(&self, key: &str, default: &str) -> String;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
