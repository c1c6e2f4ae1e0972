use std::collections::BTreeMap;
use std::sync::Mutex;

use thiserror::Error;

/// Failure reported by a [`DraftStore`] write.
#[derive(Debug, Error)]
#[error("draft store write failed: {0}")]
pub struct StoreError(pub String);

/// Durable key/value store consumed by [`DraftManager`](crate::DraftManager).
///
/// Writes are best-effort: the draft manager treats a failed `set` as a
/// skipped persistence cycle, never as a user-visible error. `remove` must
/// tolerate absent keys. No transactional guarantees are required; isolation
/// between forms comes from distinct keys chosen by the caller.
pub trait DraftStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str);
}

/// In-memory store for hosts without durable storage and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("memory store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DraftStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("memory store lock")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .expect("memory store lock")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.lock().expect("memory store lock").remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_prior_value() {
        let store = MemoryStore::new();
        store.set("k", "first").unwrap();
        store.set("k", "second").unwrap();

        assert_eq!(store.get("k").as_deref(), Some("second"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_tolerates_missing_key() {
        let store = MemoryStore::new();
        store.remove("absent");
        assert!(store.get("absent").is_none());
    }
}
