//! Key-value persistence boundary.
//!
//! The engine never touches ambient global state; completion state is read
//! from and written to whatever [`KeyValueStore`] the caller injects.

use std::collections::BTreeMap;

use crate::error::StoreError;

/// Synchronous string key-value store with whole-value replace semantics.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Write several keys. Backends that can should make this all-or-nothing.
    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// In-memory store, for tests and callers that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    values: BTreeMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_kv_get_set() {
        let mut kv = MemoryKv::new();
        assert!(kv.get("missing").unwrap().is_none());
        kv.set("k", "v1").unwrap();
        kv.set("k", "v2").unwrap();
        assert_eq!(kv.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(kv.len(), 1);
    }

    #[test]
    fn set_many_writes_every_key() {
        let mut kv = MemoryKv::new();
        kv.set_many(&[("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(kv.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(kv.get("b").unwrap().as_deref(), Some("2"));
    }
}
