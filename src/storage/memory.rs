//! In-memory blob store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{BlobStore, StorageError, StorageResult};

/// In-memory store for testing and ephemeral use.
///
/// Cloning yields a handle to the same underlying entries, so a test can
/// keep a handle while the sync coordinator owns another.
#[derive(Default, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, bytes: &[u8]) -> StorageResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = MemoryStore::new();
        store.set("k", b"value").unwrap();
        assert_eq!(store.get("k").as_deref(), Some(b"value".as_slice()));
    }

    #[test]
    fn test_absent_key() {
        let store = MemoryStore::new();
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_overwrite() {
        let store = MemoryStore::new();
        store.set("k", b"one").unwrap();
        store.set("k", b"two").unwrap();
        assert_eq!(store.get("k").as_deref(), Some(b"two".as_slice()));
    }

    #[test]
    fn test_clear() {
        let store = MemoryStore::new();
        store.set("a", b"1").unwrap();
        store.set("b", b"2").unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(store.get("a").is_none());
    }

    #[test]
    fn test_clone_shares_entries() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.set("k", b"v").unwrap();
        assert_eq!(handle.get("k").as_deref(), Some(b"v".as_slice()));
    }
}
