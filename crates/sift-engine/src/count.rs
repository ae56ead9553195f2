//! Staleness-gated total-count cache.
//!
//! A full enumeration of the source is expensive, so the cached value is
//! served immediately (even when stale) and recomputed in the background
//! at most once at a time. The cache touches no queue state, so its
//! refresh is the only work allowed to run alongside a queue mutation.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use sift_core::{Cursor, EngineConfig, EngineError};

use crate::source::PageSource;
use crate::store::{CountRecord, StateStore};

/// Cached approximate total item count with background refresh.
pub struct TotalCountCache {
    source: Arc<dyn PageSource>,
    store: Arc<dyn StateStore>,
    config: EngineConfig,
    cached: Mutex<Option<CountRecord>>,
    refreshing: AtomicBool,
}

impl TotalCountCache {
    /// Create a cache over `source`, persisted through `store`.
    pub fn new(
        source: Arc<dyn PageSource>,
        store: Arc<dyn StateStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
            cached: Mutex::new(None),
            refreshing: AtomicBool::new(false),
        }
    }

    /// Populate the in-memory cache from the store. Best-effort: a load
    /// failure just leaves the cache empty.
    pub async fn load(&self) {
        match self.store.load_count().await {
            Ok(record) => *self.cached.lock() = record,
            Err(e) => tracing::warn!("Failed to load count cache: {e}"),
        }
    }

    /// Current cached total, if any. Never blocks, never refreshes.
    pub fn get(&self) -> Option<u64> {
        (*self.cached.lock()).map(|r| r.value)
    }

    /// Return the cached total immediately and, if it is absent or older
    /// than the staleness window, kick off a background re-enumeration.
    ///
    /// Never blocks queue interactions; at most one refresh runs at a time.
    pub fn get_or_refresh(self: &Arc<Self>) -> Option<u64> {
        let cached = *self.cached.lock();
        let needs_refresh = match cached {
            None => true,
            Some(record) => now_secs().saturating_sub(record.computed_at_secs)
                >= self.config.count_staleness_secs,
        };

        if needs_refresh
            && self
                .refreshing
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            let cache = Arc::clone(self);
            tokio::spawn(async move {
                if let Err(e) = cache.refresh_now().await {
                    tracing::warn!("Total count refresh failed: {e}");
                }
                cache.refreshing.store(false, Ordering::SeqCst);
            });
        }

        cached.map(|r| r.value)
    }

    /// Enumerate the whole source and overwrite the cache.
    ///
    /// On failure the prior cached value is kept; the persistence write is
    /// best-effort.
    pub async fn refresh_now(&self) -> Result<u64, EngineError> {
        let mut total: u64 = 0;
        let mut cursor: Option<Cursor> = None;

        loop {
            let page = self
                .source
                .fetch_page(self.config.count_page_size, cursor.as_ref())
                .await?;
            total += page.ids.len() as u64;
            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        let record = CountRecord {
            value: total,
            computed_at_secs: now_secs(),
        };
        if let Err(e) = self.store.save_count(&record).await {
            tracing::warn!("Failed to persist count cache: {e}");
        }
        *self.cached.lock() = Some(record);
        tracing::debug!(total, "Total count refreshed");
        Ok(total)
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
