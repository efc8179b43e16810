//! Blob storage abstraction for persistence.

mod memory;
mod persist;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStore;
pub use persist::{PersistedScene, PersistenceGateway, SCENE_STATE_KEY};

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A synchronous process-local key/value blob store.
///
/// Implementations persist across restarts (file-backed) or live only for
/// the process (memory-backed, for tests and ephemeral embeddings).
/// Lookups distinguish "absent" from failure; an unreadable entry is
/// treated as absent, matching the clear-and-restart recovery policy of
/// the sync coordinator.
pub trait BlobStore {
    /// Read the bytes stored under `key`, if any.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Write `bytes` under `key`, overwriting any prior value.
    fn set(&self, key: &str, bytes: &[u8]) -> StorageResult<()>;

    /// Remove every key.
    fn clear(&self) -> StorageResult<()>;
}
