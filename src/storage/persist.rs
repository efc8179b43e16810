//! Persistence gateway: one atomic record for document blob + history.
//!
//! The document blob and the history log must never hydrate without each
//! other, so both live in a single JSON record under a single key. A
//! crash can lose the latest record but can never leave the two halves
//! out of step.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use loro::Frontiers;
use serde::{Deserialize, Serialize};

use super::{BlobStore, StorageError, StorageResult};
use crate::frontier;

/// Key the combined record is stored under.
pub const SCENE_STATE_KEY: &str = "scene-state";

/// The hydrated halves of a persisted record.
pub struct PersistedScene {
    /// Full-update export of the replicated document.
    pub blob: Vec<u8>,
    /// The recorded history log.
    pub log: Vec<Frontiers>,
}

#[derive(Serialize, Deserialize)]
struct SceneRecord {
    /// Base64 of the document's full-update export.
    doc: String,
    /// Encoded history log.
    frontiers: String,
}

/// Writes and restores the combined scene record through a blob store.
pub struct PersistenceGateway<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> PersistenceGateway<S> {
    /// Wrap a blob store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persist the document blob and history log, overwriting any prior
    /// record.
    pub fn save(&self, blob: &[u8], log: &[Frontiers]) -> StorageResult<()> {
        let record = SceneRecord {
            doc: BASE64.encode(blob),
            frontiers: frontier::encode_log(log),
        };
        let bytes = serde_json::to_vec(&record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.set(SCENE_STATE_KEY, &bytes)
    }

    /// Restore the persisted record, if one exists.
    ///
    /// A record that is present but unreadable is an error; the caller
    /// decides whether that escalates to a full reset.
    pub fn load(&self) -> StorageResult<Option<PersistedScene>> {
        let Some(bytes) = self.store.get(SCENE_STATE_KEY) else {
            return Ok(None);
        };
        let record: SceneRecord = serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let blob = BASE64
            .decode(&record.doc)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let log = frontier::decode_log(&record.frontiers)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(PersistedScene { blob, log }))
    }

    /// Drop all persisted state.
    pub fn clear(&self) -> StorageResult<()> {
        self.store.clear()
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use loro::ID;

    #[test]
    fn test_save_load_roundtrip() {
        let gateway = PersistenceGateway::new(MemoryStore::new());
        let log = vec![
            Frontiers::from(vec![ID::new(5, 0)]),
            Frontiers::from(vec![ID::new(5, 2)]),
        ];

        gateway.save(b"doc-bytes", &log).unwrap();
        let restored = gateway.load().unwrap().expect("record should exist");

        assert_eq!(restored.blob, b"doc-bytes");
        assert_eq!(restored.log, log);
    }

    #[test]
    fn test_load_absent() {
        let gateway = PersistenceGateway::new(MemoryStore::new());
        assert!(gateway.load().unwrap().is_none());
    }

    #[test]
    fn test_save_overwrites() {
        let gateway = PersistenceGateway::new(MemoryStore::new());
        gateway.save(b"one", &[]).unwrap();
        gateway.save(b"two", &[]).unwrap();

        let restored = gateway.load().unwrap().unwrap();
        assert_eq!(restored.blob, b"two");
        assert!(restored.log.is_empty());
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let store = MemoryStore::new();
        store.set(SCENE_STATE_KEY, b"not json at all").unwrap();

        let gateway = PersistenceGateway::new(store);
        assert!(matches!(
            gateway.load(),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_corrupt_base64_is_an_error() {
        let store = MemoryStore::new();
        store
            .set(SCENE_STATE_KEY, br#"{"doc":"%%%","frontiers":""}"#)
            .unwrap();

        let gateway = PersistenceGateway::new(store);
        assert!(gateway.load().is_err());
    }

    #[test]
    fn test_clear_removes_record() {
        let gateway = PersistenceGateway::new(MemoryStore::new());
        gateway.save(b"doc", &[]).unwrap();
        gateway.clear().unwrap();
        assert!(gateway.load().unwrap().is_none());
    }
}
