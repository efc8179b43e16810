//! Cross-context broadcast channel.
//!
//! The transport contract is thin: fire-and-forget delivery of byte
//! payloads to every other same-machine context, per-sender order
//! preserved, no cross-sender ordering, at-least-once. The document
//! engine's merge is commutative and idempotent, so duplicates and
//! reordering across senders are harmless.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A same-machine broadcast endpoint.
///
/// Receiving is poll-based: the embedder drains pending payloads on its
/// own schedule, matching the single-threaded cooperative model of the
/// sync core.
pub trait BroadcastChannel {
    /// Send bytes to every other endpoint. Fire-and-forget.
    fn send(&self, bytes: &[u8]);

    /// Drain payloads delivered since the last poll, oldest first.
    fn poll(&mut self) -> Vec<Vec<u8>>;
}

type Inbox = Arc<Mutex<VecDeque<Vec<u8>>>>;

/// In-process broadcast hub.
///
/// Every [`LocalEndpoint`] created from the same hub receives what the
/// others send. Used by tests and by embeddings that host several
/// replicas in one process.
#[derive(Default, Clone)]
pub struct LocalHub {
    inboxes: Arc<Mutex<Vec<Inbox>>>,
}

impl LocalHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new endpoint to the hub.
    pub fn endpoint(&self) -> LocalEndpoint {
        let inbox: Inbox = Arc::new(Mutex::new(VecDeque::new()));
        let index = match self.inboxes.lock() {
            Ok(mut inboxes) => {
                inboxes.push(inbox.clone());
                inboxes.len() - 1
            }
            Err(_) => 0,
        };
        LocalEndpoint {
            hub: self.clone(),
            inbox,
            index,
        }
    }
}

/// One endpoint attached to a [`LocalHub`].
pub struct LocalEndpoint {
    hub: LocalHub,
    inbox: Inbox,
    index: usize,
}

impl BroadcastChannel for LocalEndpoint {
    fn send(&self, bytes: &[u8]) {
        let Ok(inboxes) = self.hub.inboxes.lock() else {
            return;
        };
        for (index, inbox) in inboxes.iter().enumerate() {
            if index == self.index {
                continue;
            }
            if let Ok(mut queue) = inbox.lock() {
                queue.push_back(bytes.to_vec());
            }
        }
    }

    fn poll(&mut self) -> Vec<Vec<u8>> {
        match self.inbox.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// A channel that goes nowhere, for single-context embeddings.
#[derive(Default)]
pub struct NullChannel;

impl BroadcastChannel for NullChannel {
    fn send(&self, _bytes: &[u8]) {}

    fn poll(&mut self) -> Vec<Vec<u8>> {
        Vec::new()
    }
}
