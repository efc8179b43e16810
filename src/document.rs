//! Replicated scene document.
//!
//! Wraps the CRDT engine's document and exposes exactly the contract the
//! sync core needs: the ordered element list, commit/import/checkout,
//! the export modes, and an origin-tagged queue of commit notifications.
//!
//! # Schema
//!
//! ```text
//! LoroDoc
//! └── "elements": LoroList<LoroMap>   (one map per canvas element)
//! ```

use std::io::Write;
use std::sync::{Arc, Mutex};

use flate2::write::DeflateEncoder;
use flate2::Compression;
use loro::event::DiffEvent;
use loro::{
    Container, EventTriggerKind, ExportMode, Frontiers, LoroDoc, LoroList, LoroResult, LoroValue,
    Subscription, ValueOrContainer, VersionVector,
};
use serde::Serialize;

use crate::element::Element;

/// Key of the element list at the document root.
pub const ELEMENTS_KEY: &str = "elements";

/// Where a commit notification originated.
///
/// The engine tags every notification; the coordinator never infers the
/// origin from call context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOrigin {
    /// A commit sealed in this process.
    LocalEdit,
    /// An import of bytes produced elsewhere (sibling context or
    /// persisted blob).
    RemoteImport,
    /// A history navigation; purely a view change.
    Checkout,
}

impl From<EventTriggerKind> for CommitOrigin {
    fn from(kind: EventTriggerKind) -> Self {
        match kind {
            EventTriggerKind::Local => CommitOrigin::LocalEdit,
            EventTriggerKind::Import => CommitOrigin::RemoteImport,
            EventTriggerKind::Checkout => CommitOrigin::Checkout,
        }
    }
}

/// Export sizes recomputed after every non-checkout commit.
///
/// Each form is reported raw and raw-deflated. Purely observational;
/// a failed export or a failed compression reports zero instead of
/// blocking the commit path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportSizes {
    pub updates: usize,
    pub snapshot: usize,
    pub shallow_snapshot: usize,
    pub updates_compressed: usize,
    pub snapshot_compressed: usize,
    pub shallow_snapshot_compressed: usize,
}

/// Raw-deflated length of `bytes`, zero when compression fails.
fn compressed_size(bytes: &[u8]) -> usize {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    if encoder.write_all(bytes).is_err() {
        return 0;
    }
    match encoder.finish() {
        Ok(compressed) => compressed.len(),
        Err(e) => {
            log::warn!("size compression failed: {}", e);
            0
        }
    }
}

/// The replicated document holding the mirrored element list.
pub struct SceneDocument {
    doc: LoroDoc,
    pending: Arc<Mutex<Vec<CommitOrigin>>>,
    _subscription: Subscription,
}

impl SceneDocument {
    /// Create an empty document and attach the commit subscription.
    pub fn new() -> Self {
        let doc = LoroDoc::new();
        let pending: Arc<Mutex<Vec<CommitOrigin>>> = Arc::new(Mutex::new(Vec::new()));
        let queue = pending.clone();
        let subscription = doc.subscribe_root(Arc::new(move |event: DiffEvent| {
            if let Ok(mut queue) = queue.lock() {
                queue.push(CommitOrigin::from(event.triggered_by));
            }
        }));
        Self {
            doc,
            pending,
            _subscription: subscription,
        }
    }

    /// The element list container.
    pub fn elements(&self) -> LoroList {
        self.doc.get_list(ELEMENTS_KEY)
    }

    /// Seal pending local edits into one addressable change.
    pub fn commit(&self) {
        self.doc.commit();
    }

    /// Drain queued commit notifications, oldest first.
    pub fn drain_events(&self) -> Vec<CommitOrigin> {
        match self.pending.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => Vec::new(),
        }
    }

    /// Import update or snapshot bytes. Fails on malformed or
    /// incompatible input.
    pub fn import(&self, bytes: &[u8]) -> LoroResult<()> {
        self.doc.import(bytes)?;
        Ok(())
    }

    /// Incremental update since `since`; whole oplog when `None`.
    pub fn export_updates(&self, since: Option<&VersionVector>) -> Vec<u8> {
        let mode = match since {
            Some(vv) => ExportMode::updates(vv),
            None => ExportMode::all_updates(),
        };
        match self.doc.export(mode) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("update export failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Full snapshot export.
    pub fn export_snapshot(&self) -> Vec<u8> {
        match self.doc.export(ExportMode::Snapshot) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("snapshot export failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Shallow snapshot export at the current frontier.
    pub fn export_shallow_snapshot(&self) -> Vec<u8> {
        match self
            .doc
            .export(ExportMode::shallow_snapshot(&self.frontiers()))
        {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("shallow snapshot export failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Sizes of the three export forms, raw and compressed.
    pub fn export_sizes(&self) -> ExportSizes {
        let updates = self.export_updates(None);
        let snapshot = self.export_snapshot();
        let shallow_snapshot = self.export_shallow_snapshot();
        ExportSizes {
            updates: updates.len(),
            snapshot: snapshot.len(),
            shallow_snapshot: shallow_snapshot.len(),
            updates_compressed: compressed_size(&updates),
            snapshot_compressed: compressed_size(&snapshot),
            shallow_snapshot_compressed: compressed_size(&shallow_snapshot),
        }
    }

    /// The frontier of the latest committed change.
    pub fn frontiers(&self) -> Frontiers {
        self.doc.oplog_frontiers()
    }

    /// The current version vector of the oplog.
    pub fn version(&self) -> VersionVector {
        self.doc.oplog_vv()
    }

    /// Navigate the materialized state to a historical frontier.
    pub fn checkout(&self, frontiers: &Frontiers) -> LoroResult<()> {
        self.doc.checkout(frontiers)
    }

    /// Navigate back to the latest committed state.
    pub fn checkout_to_latest(&self) {
        self.doc.checkout_to_latest();
    }

    /// Materialize the element list the surface should display.
    pub fn materialize(&self) -> Vec<Element> {
        let value = self.elements().get_deep_value();
        let LoroValue::List(items) = value else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(Element::from_loro)
            .collect()
    }

    /// Number of elements currently materialized.
    pub fn element_count(&self) -> usize {
        self.elements().len()
    }

    /// Short human-readable version-vector summary, one `peer:counter`
    /// pair per known peer, peer shown by its leading digits.
    pub fn version_summary(&self) -> String {
        let vv = self.version();
        let mut parts: Vec<String> = vv
            .iter()
            .map(|(peer, counter)| {
                let peer = peer.to_string();
                let prefix = &peer[..peer.len().min(4)];
                format!("{}:{}", prefix, counter)
            })
            .collect();
        parts.sort();
        parts.join(" ")
    }
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch the element map at `index` of the list, if it is a map
/// container.
pub fn element_map_at(list: &LoroList, index: usize) -> Option<loro::LoroMap> {
    match list.get(index) {
        Some(ValueOrContainer::Container(Container::Map(map))) => Some(map),
        _ => None,
    }
}
