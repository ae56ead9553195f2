//! Seam to the key-value persistence store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use sift_core::{Cursor, EngineError, ItemId};

/// Persisted queue progress.
///
/// Written after every committed mutation. The buffer is truncated to the
/// configured cap on write, so it is a lower bound on lookahead, never
/// authoritative beyond that; the cursor is the resume point for fetching
/// past it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Items processed in the current pass.
    pub position: u64,

    /// Upcoming item identifiers, already filtered at write time.
    pub buffer: Vec<ItemId>,

    /// Continuation token past the buffer, if the source has more.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Cursor>,
}

/// Persisted total-count cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRecord {
    /// Approximate total item count.
    pub value: u64,

    /// Unix timestamp (seconds) of the enumeration that produced `value`.
    pub computed_at_secs: u64,
}

/// Key-value persistence consumed by the engine.
///
/// Three independent concerns share the seam: queue progress, the trash
/// set, and the total-count cache. Adapters keep them separately keyed so
/// clearing progress never touches the trash set.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted progress record, if one exists.
    async fn load_progress(&self) -> Result<Option<ProgressRecord>, EngineError>;

    /// Persist the progress record. Commit-path callers treat failure as
    /// fatal for the operation.
    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), EngineError>;

    /// Remove the persisted progress record entirely.
    async fn clear_progress(&self) -> Result<(), EngineError>;

    /// Load the trash set. Absence reads as empty.
    async fn load_trash(&self) -> Result<HashSet<ItemId>, EngineError>;

    /// Persist the trash set.
    async fn save_trash(&self, trash: &HashSet<ItemId>) -> Result<(), EngineError>;

    /// Load the cached total count, if one exists.
    async fn load_count(&self) -> Result<Option<CountRecord>, EngineError>;

    /// Persist the total-count cache. Best-effort for callers.
    async fn save_count(&self, record: &CountRecord) -> Result<(), EngineError>;
}
