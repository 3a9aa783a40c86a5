use super::KeyValueStore;
use crate::error::StoreError;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory implementation of [`KeyValueStore`].
///
/// Nothing survives the process. Useful for tests and headless embedding.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str, default: &str) -> String {
        self.data
            .read()
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.data.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inmemory_get_default() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("missing", "fallback"), "fallback");
    }

    #[test]
    fn test_inmemory_set_overwrites() {
        let store = InMemoryStore::new();
        store.set("key", "one").unwrap();
        store.set("key", "two").unwrap();
        assert_eq!(store.get("key", ""), "two");
    }
}
