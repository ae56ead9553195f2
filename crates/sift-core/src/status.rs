//! Queue status snapshots and review commands.

use serde::{Deserialize, Serialize};

use crate::item::ItemId;

/// Snapshot of the review queue for display.
///
/// Broadcast on every committed mutation and available on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Items processed so far in the current pass (0-based).
    pub position: u64,

    /// Approximate total item count, if a cached value exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    /// The item currently up for review, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<ItemId>,

    /// True when the buffer is empty and the source is exhausted.
    pub done: bool,

    /// True while a mutating operation is in flight.
    pub busy: bool,

    /// Number of actions available to undo.
    pub undo_count: usize,
}

impl QueueStatus {
    /// 1-based position for display.
    pub fn display_position(&self) -> u64 {
        self.position + 1
    }
}

/// A classified input for the action dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReviewCommand {
    /// Keep the current item and advance.
    Skip,

    /// Soft-delete the current item and advance.
    Trash,

    /// Reverse the most recent skip or trash.
    Undo,

    /// Jump to a 1-based absolute position.
    Jump { target: i64 },

    /// Clear progress and start the pass over.
    Restart,
}
