//! Ring buffer for entry replay
//!
//! `History` stores the most recent entries in a fixed-capacity circular
//! array so a selector that joins late can catch up before its live
//! stream begins.
//!
//! Two cursors track the window: `newest` is the slot written most
//! recently and `oldest` is the oldest slot still holding real data.
//! Once the buffer has wrapped, a write advances both cursors together,
//! so `oldest` always points at the slot about to be overwritten next.
//!
//! The buffer is owned exclusively by the hub's dispatch loop; all
//! mutation is serialized there, so no internal locking is needed.

use std::sync::Arc;

use crate::entry::Entry;

/// Capacity of the replay window
pub const HISTORY_CAPACITY: usize = 64;

/// Fixed-capacity circular buffer of recent entries
#[derive(Debug)]
pub struct History {
    slots: Vec<Option<Arc<Entry>>>,
    /// Index of the most recently written slot
    newest: usize,
    /// Index of the oldest slot still holding real data
    oldest: usize,
    /// Total entries ever written
    written: u64,
}

impl History {
    /// Create a buffer with the standard replay capacity
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Create a buffer with an explicit capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            newest: 0,
            oldest: 0,
            written: 0,
        }
    }

    /// Append an entry, overwriting the oldest slot once full
    pub fn push(&mut self, entry: Arc<Entry>) {
        let capacity = self.slots.len();
        if self.written > 0 {
            let wrapped = self.written >= capacity as u64;
            self.newest = (self.newest + 1) % capacity;
            if wrapped {
                self.oldest = (self.oldest + 1) % capacity;
            }
        }
        self.slots[self.newest] = Some(entry);
        self.written += 1;
    }

    /// Number of valid slots: `min(capacity, total writes)`
    pub fn len(&self) -> usize {
        self.written.min(self.slots.len() as u64) as usize
    }

    /// Check if nothing has been written yet
    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Total entries ever written
    pub fn total_written(&self) -> u64 {
        self.written
    }

    /// Buffer capacity
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterate the retained window, oldest to newest inclusive
    pub fn replay(&self) -> impl Iterator<Item = Arc<Entry>> + '_ {
        let capacity = self.slots.len();
        (0..self.len()).filter_map(move |i| self.slots[(self.oldest + i) % capacity].clone())
    }

    /// Inclusive cursor distance from `oldest` to `newest`, mod capacity
    ///
    /// Equals `len()` after every write; zero while empty.
    pub(crate) fn cursor_span(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let capacity = self.slots.len();
        (self.newest + capacity - self.oldest) % capacity + 1
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
