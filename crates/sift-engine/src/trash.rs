//! Write-through trash set.
//!
//! Membership means "hidden from the queue and excluded from future
//! refills". Every mutation persists before the in-memory mirror is
//! updated, so memory never claims more than the store holds.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

use sift_core::{EngineError, ItemId};

use crate::store::StateStore;

/// Persisted set of soft-deleted item identifiers.
pub struct TrashSet {
    store: Arc<dyn StateStore>,
    inner: RwLock<HashSet<ItemId>>,
}

impl TrashSet {
    /// Create an empty trash set backed by `store`. Call [`Self::reload`]
    /// before first use.
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            inner: RwLock::new(HashSet::new()),
        }
    }

    /// Refresh the in-memory mirror from the store.
    ///
    /// Run at load/jump time so state trashed through another surface is
    /// picked up.
    pub async fn reload(&self) -> Result<(), EngineError> {
        let loaded = self.store.load_trash().await?;
        tracing::debug!(count = loaded.len(), "Loaded trash set");
        *self.inner.write() = loaded;
        Ok(())
    }

    /// Check membership.
    pub fn contains(&self, id: &ItemId) -> bool {
        self.inner.read().contains(id)
    }

    /// Snapshot the current membership for filtering.
    pub fn snapshot(&self) -> HashSet<ItemId> {
        self.inner.read().clone()
    }

    /// Number of trashed items.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Check if no items are trashed.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Mark `id` trashed, persisting before the mirror is updated.
    pub async fn insert(&self, id: ItemId) -> Result<(), EngineError> {
        let mut next = self.snapshot();
        if !next.insert(id.clone()) {
            return Ok(());
        }
        self.store.save_trash(&next).await?;
        self.inner.write().insert(id);
        Ok(())
    }

    /// Remove `id` from the trash set. Removing an absent id is a no-op,
    /// which keeps undo idempotent with respect to membership.
    pub async fn remove(&self, id: &ItemId) -> Result<(), EngineError> {
        let mut next = self.snapshot();
        if !next.remove(id) {
            return Ok(());
        }
        self.store.save_trash(&next).await?;
        self.inner.write().remove(id);
        Ok(())
    }

    /// Filter `ids`, keeping only identifiers absent from the set.
    pub fn retain_untrashed(&self, ids: impl IntoIterator<Item = ItemId>) -> Vec<ItemId> {
        let inner = self.inner.read();
        ids.into_iter().filter(|id| !inner.contains(id)).collect()
    }
}
