//! Test doubles for the source and store seams.
//!
//! `ScriptedSource` pages over a fixed item list with an offset cursor;
//! `MemoryStore` keeps everything in memory with failure-injection knobs.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use sift_core::{Cursor, EngineError, ItemId, Page};

use crate::source::PageSource;
use crate::store::{CountRecord, ProgressRecord, StateStore};

/// Page source over a fixed, ordered item list.
pub struct ScriptedSource {
    items: Vec<ItemId>,
    fail_next: AtomicBool,
    fetch_count: AtomicUsize,
    delay: Mutex<Duration>,
}

impl ScriptedSource {
    /// Create a source over `items` in the given order.
    pub fn new(items: impl IntoIterator<Item = impl Into<ItemId>>) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            fail_next: AtomicBool::new(false),
            fetch_count: AtomicUsize::new(0),
            delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Create a source of `count` items named `item-0000` .. in order.
    pub fn sequential(count: usize) -> Self {
        Self::new((0..count).map(|i| format!("item-{i:04}")))
    }

    /// Fail the next fetch with a source error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Sleep this long inside every fetch.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(
        &self,
        page_size: usize,
        cursor: Option<&Cursor>,
    ) -> Result<Page, EngineError> {
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(EngineError::SourceFetch("scripted failure".to_string()));
        }
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        let offset: usize = match cursor {
            None => 0,
            Some(c) => c
                .as_ref()
                .parse()
                .map_err(|_| EngineError::SourceFetch(format!("bad cursor: {}", c.as_ref())))?,
        };
        let end = (offset + page_size).min(self.items.len());
        let ids = self.items[offset.min(self.items.len())..end].to_vec();

        if end < self.items.len() {
            Ok(Page::more(ids, end.to_string()))
        } else {
            Ok(Page::last(ids))
        }
    }
}

/// In-memory state store with failure injection.
#[derive(Default)]
pub struct MemoryStore {
    progress: Mutex<Option<ProgressRecord>>,
    trash: Mutex<HashSet<ItemId>>,
    count: Mutex<Option<CountRecord>>,
    fail_writes: AtomicBool,
    progress_writes: AtomicUsize,
    trash_writes: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every save fail until turned off again.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Seed a persisted progress record.
    pub fn seed_progress(&self, record: ProgressRecord) {
        *self.progress.lock() = Some(record);
    }

    /// Seed trash membership.
    pub fn seed_trash(&self, ids: impl IntoIterator<Item = ItemId>) {
        self.trash.lock().extend(ids);
    }

    /// Seed the count cache.
    pub fn seed_count(&self, record: CountRecord) {
        *self.count.lock() = Some(record);
    }

    /// Current persisted progress.
    pub fn progress_snapshot(&self) -> Option<ProgressRecord> {
        self.progress.lock().clone()
    }

    /// Current persisted trash membership.
    pub fn trash_snapshot(&self) -> HashSet<ItemId> {
        self.trash.lock().clone()
    }

    /// Current persisted count cache.
    pub fn count_snapshot(&self) -> Option<CountRecord> {
        *self.count.lock()
    }

    /// Number of successful progress writes.
    pub fn progress_write_count(&self) -> usize {
        self.progress_writes.load(Ordering::SeqCst)
    }

    /// Number of successful trash writes.
    pub fn trash_write_count(&self) -> usize {
        self.trash_writes.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> Result<(), EngineError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(EngineError::Persistence("injected write failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load_progress(&self) -> Result<Option<ProgressRecord>, EngineError> {
        Ok(self.progress.lock().clone())
    }

    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), EngineError> {
        self.check_write()?;
        *self.progress.lock() = Some(record.clone());
        self.progress_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear_progress(&self) -> Result<(), EngineError> {
        self.check_write()?;
        *self.progress.lock() = None;
        Ok(())
    }

    async fn load_trash(&self) -> Result<HashSet<ItemId>, EngineError> {
        Ok(self.trash.lock().clone())
    }

    async fn save_trash(&self, trash: &HashSet<ItemId>) -> Result<(), EngineError> {
        self.check_write()?;
        *self.trash.lock() = trash.clone();
        self.trash_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_count(&self) -> Result<Option<CountRecord>, EngineError> {
        Ok(*self.count.lock())
    }

    async fn save_count(&self, record: &CountRecord) -> Result<(), EngineError> {
        self.check_write()?;
        *self.count.lock() = Some(*record);
        Ok(())
    }
}
