//! Bounded undo history.

use std::collections::VecDeque;

use sift_core::ItemId;

/// One reversible advancing action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoEntry {
    /// The item was kept and the queue advanced past it.
    Skip(ItemId),

    /// The item was soft-deleted and the queue advanced past it.
    Trash(ItemId),
}

impl UndoEntry {
    /// The item this entry would bring back to the front of the queue.
    pub fn item_id(&self) -> &ItemId {
        match self {
            UndoEntry::Skip(id) | UndoEntry::Trash(id) => id,
        }
    }
}

/// Bounded stack of the most recent advancing actions, newest first.
///
/// Pushing past capacity evicts the oldest entry silently.
#[derive(Debug)]
pub struct UndoStack {
    entries: VecDeque<UndoEntry>,
    capacity: usize,
}

impl UndoStack {
    /// Create an empty stack holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an action, evicting the oldest entry if at capacity.
    pub fn push(&mut self, entry: UndoEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Remove and return the newest entry.
    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop_front()
    }

    /// Look at the newest entry without removing it.
    pub fn peek(&self) -> Option<&UndoEntry> {
        self.entries.front()
    }

    /// Number of undoable actions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there is nothing to undo.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all history. Used when a jump or restart invalidates it.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
