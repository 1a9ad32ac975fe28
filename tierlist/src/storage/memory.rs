//! In-memory storage for ephemeral sessions and tests

use super::{validate_key, Storage};
use crate::error::{Result, TierlistError};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Cheaply cloneable map-backed storage. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: Arc<DashMap<String, Value>>,
    writes: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make subsequent writes fail (simulates a full or read-only disk)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<Value>> {
        validate_key(key)?;
        Ok(self.records.get(key).map(|v| v.value().clone()))
    }

    fn write(&self, key: &str, value: &Value) -> Result<()> {
        validate_key(key)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TierlistError::storage(key, "writes disabled"));
        }
        self.records.insert(key.to_string(), value.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.records.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clones_share_records() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.write("index", &json!(["a"])).unwrap();
        assert_eq!(other.read("index").unwrap(), Some(json!(["a"])));
        assert_eq!(other.write_count(), 1);
    }

    #[test]
    fn test_failing_writes() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        assert!(storage.write("index", &json!([])).is_err());
        assert_eq!(storage.write_count(), 0);
        assert!(!storage.contains("index"));
    }
}
