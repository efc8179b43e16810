//! Error taxonomy for the sync core.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors surfaced by the sync core.
///
/// Nothing on the commit path returns these to the caller: export and
/// persistence faults are absorbed with a logged degradation, and
/// corruption escalates to [`SyncError::CorruptState`] after the
/// persisted state has been cleared.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A serialized frontier entry did not parse.
    #[error("malformed frontier entry: {0:?}")]
    MalformedFrontier(String),

    /// A checkout was requested outside the history range.
    #[error("checkout index {index} outside [-1, {tail}]")]
    CheckoutOutOfRange { index: isize, tail: isize },

    /// Persisted or broadcast bytes could not be imported. The persisted
    /// state has been cleared; the process must restart.
    #[error("replica state is corrupt; persisted state cleared, restart required")]
    CorruptState,

    /// Error from the replicated-document engine.
    #[error("document error: {0}")]
    Document(#[from] loro::LoroError),

    /// Error from the blob store.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
