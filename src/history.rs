//! Append-only log of committed frontiers plus the view cursor.
//!
//! The log gains exactly one entry per non-checkout commit, local or
//! imported. The cursor tracks which entry the rendering surface shows:
//! `-1` is the empty initial state, `tail` is live. Checkout moves only
//! the cursor; the log itself is cleared only by an explicit reset.

use loro::Frontiers;

use crate::error::SyncResult;
use crate::frontier;

/// The history log and view cursor.
#[derive(Debug)]
pub struct VersionHistory {
    entries: Vec<Frontiers>,
    cursor: isize,
}

impl Default for VersionHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionHistory {
    /// Create an empty history with the cursor at the initial state.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: -1,
        }
    }

    /// Append a committed frontier and move the cursor to it.
    pub fn record(&mut self, frontiers: Frontiers) {
        self.entries.push(frontiers);
        self.cursor = self.tail();
    }

    /// The history entry at `index`, if in range.
    pub fn entry(&self, index: isize) -> Option<&Frontiers> {
        usize::try_from(index).ok().and_then(|i| self.entries.get(i))
    }

    /// Index of the live edge; `-1` while the log is empty.
    pub fn tail(&self) -> isize {
        self.entries.len() as isize - 1
    }

    /// The view cursor, in `[-1, tail]`.
    pub fn cursor(&self) -> isize {
        self.cursor
    }

    /// Move the view cursor. The caller has already validated the range.
    pub fn set_cursor(&mut self, cursor: isize) {
        debug_assert!(cursor >= -1 && cursor <= self.tail());
        self.cursor = cursor;
    }

    /// Whether the cursor sits at the live edge. Local edits are only
    /// accepted while live.
    pub fn is_live(&self) -> bool {
        self.cursor == self.tail()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no commit has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The raw log, oldest first.
    pub fn entries(&self) -> &[Frontiers] {
        &self.entries
    }

    /// Serialize the log for persistence.
    pub fn encode(&self) -> String {
        frontier::encode_log(&self.entries)
    }

    /// Rebuild the log from its persisted form; the cursor lands on the
    /// tail.
    pub fn decode(text: &str) -> SyncResult<Self> {
        Ok(Self::restored(frontier::decode_log(text)?))
    }

    /// Adopt an already-decoded log; the cursor lands on the tail.
    pub fn restored(entries: Vec<Frontiers>) -> Self {
        let mut history = Self {
            entries,
            cursor: -1,
        };
        history.cursor = history.tail();
        history
    }

    /// Forget everything. Only the explicit full reset calls this.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = -1;
    }
}
