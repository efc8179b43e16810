//! Orchestration of change detection, history, broadcast and
//! persistence.
//!
//! The coordinator owns the replicated document for the life of the
//! process. The rendering surface never touches the document directly:
//! it hands full element snapshots to [`SyncCoordinator::observe_scene`]
//! and applies the refreshed scenes it takes back via
//! [`SyncCoordinator::take_refresh`]. Everything runs on one logical
//! thread; each call drains the document's commit notifications before
//! returning.

use loro::{Frontiers, VersionVector};

use crate::broadcast::BroadcastChannel;
use crate::diff;
use crate::document::{CommitOrigin, ExportSizes, SceneDocument};
use crate::element::{self, Element};
use crate::error::{SyncError, SyncResult};
use crate::history::VersionHistory;
use crate::storage::{BlobStore, PersistenceGateway};

/// Reacts to every document commit: broadcast on local edits, history +
/// persistence on any non-checkout commit, scene refresh on anything
/// that did not originate from the surface.
pub struct SyncCoordinator<B: BroadcastChannel, S: BlobStore> {
    scene: SceneDocument,
    history: VersionHistory,
    channel: B,
    gateway: PersistenceGateway<S>,
    /// Version vector up to which local changes were already broadcast.
    last_broadcast: Option<VersionVector>,
    /// Version aggregate of the previously observed snapshot; the
    /// dirty-check guard against reacting to programmatic scene updates.
    last_observed: i64,
    /// Scene the surface should redraw, queued by imports, checkouts and
    /// hydration.
    refresh: Option<Vec<Element>>,
    sizes: ExportSizes,
}

impl<B: BroadcastChannel, S: BlobStore> SyncCoordinator<B, S> {
    /// Create a coordinator around an empty document.
    ///
    /// Persisted state is not touched here; call [`hydrate`] once the
    /// surface has painted its first frame (two-phase startup).
    ///
    /// [`hydrate`]: SyncCoordinator::hydrate
    pub fn new(channel: B, store: S) -> Self {
        Self {
            scene: SceneDocument::new(),
            history: VersionHistory::new(),
            channel,
            gateway: PersistenceGateway::new(store),
            last_broadcast: None,
            last_observed: -1,
            refresh: None,
            sizes: ExportSizes::default(),
        }
    }

    /// Restore history and document from the persisted record.
    ///
    /// The history log hydrates first, then the blob imports, and the
    /// view cursor is forced to the live edge. The hydration import is
    /// not recorded as a new history entry; the restored log already
    /// ends at the imported state. The broadcast marker is primed to the
    /// hydrated version, so the first local commit afterwards broadcasts
    /// only its own delta; a sibling that cleared its own store instead
    /// of hydrating holds any such delta as a pending import until full
    /// updates reach it. A corrupt record clears all persisted state and
    /// returns [`SyncError::CorruptState`]; the process must restart.
    pub fn hydrate(&mut self) -> SyncResult<()> {
        let persisted = match self.gateway.load() {
            Ok(persisted) => persisted,
            Err(e) => {
                log::warn!("persisted state unreadable: {}", e);
                return self.corrupt_state();
            }
        };
        let Some(persisted) = persisted else {
            return Ok(());
        };

        self.history = VersionHistory::restored(persisted.log);
        if !persisted.blob.is_empty() {
            self.scene.checkout_to_latest();
            if let Err(e) = self.scene.import(&persisted.blob) {
                log::warn!("persisted document rejected: {}", e);
                return self.corrupt_state();
            }
        }
        // The import above raises a notification; swallow it so
        // hydration never duplicates the restored tail entry.
        self.scene.drain_events();
        self.last_broadcast = Some(self.scene.version());
        self.sizes = self.scene.export_sizes();
        self.refresh = Some(self.scene.materialize());
        Ok(())
    }

    /// Handle a fresh element snapshot from the rendering surface.
    ///
    /// Detection runs only when the snapshot's version aggregate equals
    /// the aggregate observed last time (a repeated, self-consistent
    /// emission) and the view cursor sits at the live edge; programmatic
    /// scene updates and history browsing never commit.
    pub fn observe_scene(&mut self, elements: &[Element]) -> SyncResult<()> {
        let aggregate = element::version_aggregate(elements);
        if aggregate == self.last_observed && self.history.is_live() {
            if diff::sync_observed(&self.scene.elements(), elements)? {
                self.scene.commit();
            }
        }
        self.last_observed = aggregate;
        self.pump();
        Ok(())
    }

    /// Import one broadcast payload from a sibling context.
    pub fn handle_remote(&mut self, bytes: &[u8]) -> SyncResult<()> {
        if let Err(e) = self.scene.import(bytes) {
            log::warn!("broadcast payload rejected: {}", e);
            return self.corrupt_state();
        }
        self.pump();
        Ok(())
    }

    /// Drain the broadcast channel and import every pending payload.
    pub fn poll_remote(&mut self) -> SyncResult<()> {
        for bytes in self.channel.poll() {
            self.handle_remote(&bytes)?;
        }
        Ok(())
    }

    /// Navigate the displayed state to a history entry.
    ///
    /// `-1` restores the empty initial state, `tail` the live state.
    /// Checkout never records history, broadcasts or persists; it only
    /// moves the view.
    pub fn checkout(&mut self, index: isize) -> SyncResult<()> {
        let tail = self.history.tail();
        if index < -1 || index > tail {
            return Err(SyncError::CheckoutOutOfRange { index, tail });
        }

        if index == -1 {
            self.scene.checkout(&Frontiers::default())?;
        } else if index == tail {
            self.scene.checkout_to_latest();
        } else {
            // In range and not the tail, so the entry exists.
            if let Some(frontiers) = self.history.entry(index) {
                self.scene.checkout(frontiers)?;
            }
        }
        self.history.set_cursor(index);
        self.pump();
        Ok(())
    }

    /// Clear all persisted state. The caller restarts the process; no
    /// attempt is made to keep this replica usable afterwards.
    pub fn reset(&mut self) -> SyncResult<()> {
        self.gateway.clear()?;
        self.history.clear();
        Ok(())
    }

    /// Take the pending scene refresh, if imports, checkouts or
    /// hydration produced one since the last call.
    pub fn take_refresh(&mut self) -> Option<Vec<Element>> {
        self.refresh.take()
    }

    /// The history log and view cursor.
    pub fn history(&self) -> &VersionHistory {
        &self.history
    }

    /// The replicated document.
    pub fn document(&self) -> &SceneDocument {
        &self.scene
    }

    /// Export sizes recomputed at the latest non-checkout commit.
    pub fn sizes(&self) -> ExportSizes {
        self.sizes
    }

    /// Version-vector diagnostic string.
    pub fn version_summary(&self) -> String {
        self.scene.version_summary()
    }

    /// The blob store backing persistence.
    pub fn store(&self) -> &S {
        self.gateway.store()
    }

    /// React to every queued commit notification.
    fn pump(&mut self) {
        for origin in self.scene.drain_events() {
            if origin == CommitOrigin::LocalEdit {
                let delta = self.scene.export_updates(self.last_broadcast.as_ref());
                if !delta.is_empty() {
                    self.channel.send(&delta);
                }
                self.last_broadcast = Some(self.scene.version());
            }

            if origin != CommitOrigin::Checkout {
                self.history.record(self.scene.frontiers());
                let blob = self.scene.export_updates(None);
                if let Err(e) = self.gateway.save(&blob, self.history.entries()) {
                    // Persistence must never block the commit path.
                    log::warn!("persist failed: {}", e);
                }
                self.sizes = self.scene.export_sizes();
            }

            if origin != CommitOrigin::LocalEdit {
                self.refresh = Some(self.scene.materialize());
            }
        }
    }

    /// Corruption policy: drop everything persisted and tell the caller
    /// to restart. There is no partial-recovery path.
    fn corrupt_state(&mut self) -> SyncResult<()> {
        if let Err(e) = self.gateway.clear() {
            log::warn!("failed to clear persisted state: {}", e);
        }
        Err(SyncError::CorruptState)
    }
}
