//! sketchsync: local-first sync core for canvas documents.
//!
//! Keeps a mutable, surface-owned list of canvas elements mirrored into
//! a replicated CRDT document so that sibling contexts on one machine
//! stay converged, every committed state stays addressable through a
//! history log, and the document survives restarts via a persisted
//! combined record.
//!
//! The crate is the layer between three external collaborators it does
//! not implement: the rendering surface (element snapshots in, scene
//! refreshes out), the CRDT engine (merge semantics), and the transport
//! and blob-store primitives (modeled as the [`broadcast::BroadcastChannel`]
//! and [`storage::BlobStore`] traits).

pub mod broadcast;
pub mod coordinator;
pub mod diff;
pub mod document;
pub mod element;
pub mod error;
pub mod frontier;
pub mod history;
pub mod storage;

pub use broadcast::{BroadcastChannel, LocalEndpoint, LocalHub, NullChannel};
pub use coordinator::SyncCoordinator;
pub use document::{CommitOrigin, ExportSizes, SceneDocument};
pub use element::{Element, FieldValue, version_aggregate};
pub use error::{SyncError, SyncResult};
pub use history::VersionHistory;
pub use storage::{BlobStore, MemoryStore, PersistenceGateway};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStore;

// Re-export the engine types that appear in this crate's public API.
pub use loro::{Frontiers, VersionVector};
