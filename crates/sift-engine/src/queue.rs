//! Queue Engine
//!
//! The QueueEngine owns the review pass over the paginated media source:
//! - the global position counter and continuation cursor
//! - the lookahead buffer and its refill policy
//! - the jump/rebuild algorithm
//! - undo application for the bounded history
//!
//! ## Commit discipline
//!
//! Every mutating operation computes its next state on locals, persists
//! the progress record, and only then applies the state in memory and
//! broadcasts it. A failed fetch or persist therefore leaves the
//! committed state exactly as it was, and the caller can retry.
//!
//! ## Serialization
//!
//! A single operation lock (`tokio::sync::Mutex::try_lock`) gates every
//! public mutating operation; a second call while one is in flight is a
//! no-op that reports `busy`, never queued. The total-count cache is the
//! only work that runs alongside a queue mutation - it touches disjoint
//! state.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use sift_core::{Cursor, EngineConfig, EngineError, ItemId, QueueStatus};

use crate::count::TotalCountCache;
use crate::source::PageSource;
use crate::store::{ProgressRecord, StateStore};
use crate::trash::TrashSet;
use crate::undo::{UndoEntry, UndoStack};

/// In-memory queue state for the current pass.
///
/// `buffer[0]` is the item currently up for review. The pass is done
/// exactly when the buffer is empty and the cursor is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueState {
    /// Items definitively processed (skipped or trashed) this pass.
    pub position: u64,

    /// Upcoming items, already fetched and filtered against the trash set.
    pub buffer: VecDeque<ItemId>,

    /// Resume point in the source past the buffer; `None` means exhausted.
    pub cursor: Option<Cursor>,
}

impl QueueState {
    /// The item currently up for review.
    pub fn current(&self) -> Option<&ItemId> {
        self.buffer.front()
    }

    /// Done exactly when the buffer is empty and the cursor is gone.
    pub fn done(&self) -> bool {
        self.buffer.is_empty() && self.cursor.is_none()
    }
}

/// Top up a lookahead buffer from the source.
///
/// Pure computation over its inputs: if the buffer is already at or above
/// the low-water mark, or the cursor is gone (source exhausted), the
/// inputs come back unchanged. Otherwise exactly one page is fetched,
/// filtered against `trash`, and appended with duplicates dropped (first
/// occurrence wins, order preserved). Repeated low-water conditions are
/// resolved by the caller invoking refill again, so a slow or empty page
/// never blocks a caller in a loop here.
pub async fn refill(
    source: &dyn PageSource,
    trash: &HashSet<ItemId>,
    mut buffer: VecDeque<ItemId>,
    cursor: Option<Cursor>,
    config: &EngineConfig,
) -> Result<(VecDeque<ItemId>, Option<Cursor>), EngineError> {
    if buffer.len() >= config.low_water {
        return Ok((buffer, cursor));
    }
    let Some(cursor) = cursor else {
        return Ok((buffer, None));
    };

    let page = source.fetch_page(config.page_size, Some(&cursor)).await?;
    let mut seen: HashSet<ItemId> = buffer.iter().cloned().collect();
    for id in page.ids {
        if trash.contains(&id) || !seen.insert(id.clone()) {
            continue;
        }
        buffer.push_back(id);
    }
    let next = if page.has_more { page.next_cursor } else { None };
    tracing::debug!(len = buffer.len(), more = next.is_some(), "Refilled buffer");
    Ok((buffer, next))
}

/// The review-queue engine.
///
/// Mutations broadcast a [`QueueStatus`] snapshot on commit; subscribe via
/// [`QueueEngine::subscribe`] for reactive display, or poll
/// [`QueueEngine::status`].
pub struct QueueEngine {
    source: Arc<dyn PageSource>,
    store: Arc<dyn StateStore>,
    trash: TrashSet,
    count: Arc<TotalCountCache>,
    config: EngineConfig,

    /// Committed state; `None` until the first successful load.
    state: RwLock<Option<QueueState>>,

    undo: Mutex<UndoStack>,

    /// Single-operation gate. `try_lock` failure means busy, and the
    /// caller's request is dropped rather than queued.
    op_lock: tokio::sync::Mutex<()>,

    /// Mirrors whether an operation currently holds `op_lock`. Status
    /// reads probe this flag, never the lock itself, so a poll can not
    /// steal the gate from a racing mutation.
    busy: AtomicBool,

    /// Bumped by restart/jump so a superseded load result is discarded
    /// instead of applied.
    generation: AtomicU64,

    tx: watch::Sender<QueueStatus>,
    rx: watch::Receiver<QueueStatus>,
}

impl QueueEngine {
    /// Create an engine over the given collaborators. Call
    /// [`Self::load_or_initialize`] before issuing commands.
    pub fn new(
        source: Arc<dyn PageSource>,
        store: Arc<dyn StateStore>,
        count: Arc<TotalCountCache>,
        config: EngineConfig,
    ) -> Self {
        let undo_capacity = config.undo_capacity;
        let (tx, rx) = watch::channel(QueueStatus::default());
        Self {
            source,
            trash: TrashSet::new(store.clone()),
            store,
            count,
            config,
            state: RwLock::new(None),
            undo: Mutex::new(UndoStack::new(undo_capacity)),
            op_lock: tokio::sync::Mutex::new(()),
            busy: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            tx,
            rx,
        }
    }

    /// Subscribe to status changes. Clone the receiver per subscriber.
    pub fn subscribe(&self) -> watch::Receiver<QueueStatus> {
        self.rx.clone()
    }

    /// The trash set backing this engine.
    pub fn trash_set(&self) -> &TrashSet {
        &self.trash
    }

    /// Current status snapshot.
    pub fn status(&self) -> QueueStatus {
        self.snapshot(self.busy.load(Ordering::SeqCst))
    }

    /// Try to claim the single-operation gate.
    ///
    /// Returns `None` when another operation is in flight; the permit
    /// clears the busy flag on drop, including early error returns.
    fn try_begin(&self) -> Option<OpPermit<'_>> {
        let lock = self.op_lock.try_lock().ok()?;
        self.busy.store(true, Ordering::SeqCst);
        Some(OpPermit {
            busy: &self.busy,
            _lock: lock,
        })
    }

    /// Committed state, if loaded. Diagnostic read access.
    pub fn state_snapshot(&self) -> Option<QueueState> {
        self.state.read().clone()
    }

    // =========================================================================
    // Load / Restart
    // =========================================================================

    /// Load persisted progress, or initialize a fresh pass.
    ///
    /// The persisted buffer is filtered against the current trash set
    /// (state may have been trashed through another surface), topped up
    /// once via refill, and committed. On failure the engine stays in its
    /// previous state and the call may simply be retried.
    pub async fn load_or_initialize(&self) -> Result<QueueStatus, EngineError> {
        let Some(_op) = self.try_begin() else {
            return Ok(self.snapshot(true));
        };
        let generation = self.generation.load(Ordering::SeqCst);
        self.load_inner(generation).await?;
        Ok(self.snapshot(false))
    }

    /// Clear persisted progress entirely and re-run the load.
    ///
    /// Does not touch the trash set or the total-count cache.
    pub async fn restart(&self) -> Result<QueueStatus, EngineError> {
        let Some(_op) = self.try_begin() else {
            return Ok(self.snapshot(true));
        };
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.store.clear_progress().await?;
        self.undo.lock().clear();
        tracing::debug!("Progress cleared, reloading");
        self.load_inner(generation).await?;
        Ok(self.snapshot(false))
    }

    async fn load_inner(&self, generation: u64) -> Result<(), EngineError> {
        self.trash.reload().await?;
        let record = self.store.load_progress().await?;
        let fresh = record.is_none();
        let record = record.unwrap_or_default();

        // Defensive filter: ids may have been trashed elsewhere since the
        // record was written.
        let mut buffer: VecDeque<ItemId> = self.trash.retain_untrashed(record.buffer).into();
        let mut cursor = record.cursor;

        if fresh && buffer.is_empty() {
            let page = self.source.fetch_page(self.config.page_size, None).await?;
            buffer = self.trash.retain_untrashed(page.ids).into();
            cursor = if page.has_more { page.next_cursor } else { None };
        }

        let trash = self.trash.snapshot();
        let (buffer, cursor) = self.refill_until_current(&trash, buffer, cursor).await?;

        let state = QueueState {
            position: record.position,
            buffer,
            cursor,
        };
        self.persist(&state).await?;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Discarding superseded load result");
            return Ok(());
        }
        tracing::debug!(position = state.position, len = state.buffer.len(), "Loaded queue");
        self.commit(state);
        Ok(())
    }

    // =========================================================================
    // Advance (skip / trash)
    // =========================================================================

    /// Keep the current item and advance past it.
    pub async fn skip(&self) -> Result<QueueStatus, EngineError> {
        let Some(_op) = self.try_begin() else {
            tracing::debug!("skip dropped: operation in flight");
            return Ok(self.snapshot(true));
        };
        self.advance(false).await?;
        Ok(self.snapshot(false))
    }

    /// Soft-delete the current item and advance past it.
    pub async fn trash_current(&self) -> Result<QueueStatus, EngineError> {
        let Some(_op) = self.try_begin() else {
            tracing::debug!("trash dropped: operation in flight");
            return Ok(self.snapshot(true));
        };
        self.advance(true).await?;
        Ok(self.snapshot(false))
    }

    async fn advance(&self, to_trash: bool) -> Result<(), EngineError> {
        let Some(mut next) = self.state.read().clone() else {
            return Err(EngineError::NotLoaded);
        };
        let Some(current) = next.buffer.pop_front() else {
            tracing::debug!("advance dropped: nothing to advance past");
            return Ok(());
        };
        next.position += 1;

        // Refill sees the current item as trashed so it cannot come back.
        let mut trash = self.trash.snapshot();
        if to_trash {
            trash.insert(current.clone());
        }
        let (buffer, cursor) = self
            .refill_until_current(&trash, next.buffer, next.cursor)
            .await?;
        next.buffer = buffer;
        next.cursor = cursor;

        if to_trash {
            self.trash.insert(current.clone()).await?;
        }
        self.persist(&next).await?;

        self.undo.lock().push(if to_trash {
            UndoEntry::Trash(current)
        } else {
            UndoEntry::Skip(current)
        });
        self.commit(next);
        Ok(())
    }

    // =========================================================================
    // Undo
    // =========================================================================

    /// Reverse the most recent skip or trash.
    ///
    /// The undone item is reinserted at the buffer front and becomes the
    /// new current item, even if refills reshaped the buffer since; its
    /// exact prior slot is not restored. A trashed item is removed from
    /// the trash set first (removal of an absent id is a no-op).
    pub async fn undo_last(&self) -> Result<QueueStatus, EngineError> {
        let Some(_op) = self.try_begin() else {
            tracing::debug!("undo dropped: operation in flight");
            return Ok(self.snapshot(true));
        };
        let Some(entry) = self.undo.lock().peek().cloned() else {
            tracing::debug!("undo dropped: empty history");
            return Ok(self.snapshot(false));
        };
        let Some(mut next) = self.state.read().clone() else {
            return Err(EngineError::NotLoaded);
        };

        if let UndoEntry::Trash(id) = &entry {
            self.trash.remove(id).await?;
        }
        next.position = next.position.saturating_sub(1);
        next.buffer.push_front(entry.item_id().clone());

        self.persist(&next).await?;
        // Popped only after the commit succeeds so a failed undo can retry.
        self.undo.lock().pop();
        self.commit(next);
        Ok(self.snapshot(false))
    }

    // =========================================================================
    // Jump
    // =========================================================================

    /// Rebuild queue state at an absolute 0-based offset in source order.
    ///
    /// Pages are re-walked from the beginning of the source. A page that
    /// ends at or before the target is skipped whole - only its length and
    /// continuation token are consumed - so the cost is one fetch per
    /// skipped page, bounded by `ceil(target / page_size)` round trips;
    /// only the boundary page is materialized and filtered. A target at
    /// or beyond the true total clamps to the exhausted (done) state.
    pub async fn jump_to(&self, target: u64) -> Result<QueueStatus, EngineError> {
        let Some(_op) = self.try_begin() else {
            tracing::debug!("jump dropped: operation in flight");
            return Ok(self.snapshot(true));
        };
        if self.state.read().is_none() {
            return Err(EngineError::NotLoaded);
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.trash.reload().await?;
        let trash = self.trash.snapshot();

        let mut consumed: u64 = 0;
        let mut cursor: Option<Cursor> = None;
        let (position, buffer, cursor) = loop {
            let page = self
                .source
                .fetch_page(self.config.page_size, cursor.as_ref())
                .await?;
            let page_len = page.ids.len() as u64;

            if page.is_empty() {
                // Exhausted before the target: clamp.
                break (consumed.min(target), VecDeque::new(), None);
            }
            if consumed + page_len <= target && page.has_more {
                consumed += page_len;
                match page.next_cursor {
                    Some(next) => cursor = Some(next),
                    None => break (consumed.min(target), VecDeque::new(), None),
                }
                continue;
            }

            // The target lies within this page, or the source ends here.
            let start = target.saturating_sub(consumed) as usize;
            let ids: Vec<ItemId> = page
                .ids
                .into_iter()
                .skip(start)
                .filter(|id| !trash.contains(id))
                .collect();
            let next = if page.has_more { page.next_cursor } else { None };
            break ((consumed + page_len).min(target), ids.into(), next);
        };

        let (buffer, cursor) = self.refill_until_current(&trash, buffer, cursor).await?;
        let state = QueueState {
            position,
            buffer,
            cursor,
        };
        self.persist(&state).await?;
        // History refers to positions that no longer line up.
        self.undo.lock().clear();
        tracing::debug!(position, "Jumped");
        self.commit(state);
        Ok(self.snapshot(false))
    }

    // =========================================================================
    // Commit path
    // =========================================================================

    async fn persist(&self, state: &QueueState) -> Result<(), EngineError> {
        let mut buffer: Vec<ItemId> = state.buffer.iter().cloned().collect();
        buffer.truncate(self.config.persist_buffer_max);
        let record = ProgressRecord {
            position: state.position,
            buffer,
            cursor: state.cursor.clone(),
        };
        self.store.save_progress(&record).await
    }

    fn commit(&self, state: QueueState) {
        *self.state.write() = Some(state);
        let _ = self.tx.send(self.snapshot(false));
    }

    /// Refill until the buffer has a current item or the source is
    /// exhausted.
    ///
    /// A single refill fetches one page, and a page that filters down to
    /// nothing (a fully trashed stretch of the source) would leave the
    /// committed state with no current item while more source sits behind
    /// the cursor; skip and trash would then have nothing to advance past
    /// and the pass would wedge. Each iteration fetches one page, so the
    /// loop ends as soon as an untrashed item turns up or the cursor is
    /// gone.
    async fn refill_until_current(
        &self,
        trash: &HashSet<ItemId>,
        mut buffer: VecDeque<ItemId>,
        mut cursor: Option<Cursor>,
    ) -> Result<(VecDeque<ItemId>, Option<Cursor>), EngineError> {
        loop {
            let (next_buffer, next_cursor) =
                refill(self.source.as_ref(), trash, buffer, cursor, &self.config).await?;
            buffer = next_buffer;
            cursor = next_cursor;
            if !buffer.is_empty() || cursor.is_none() {
                return Ok((buffer, cursor));
            }
        }
    }

    fn snapshot(&self, busy: bool) -> QueueStatus {
        let state = self.state.read();
        match state.as_ref() {
            Some(s) => QueueStatus {
                position: s.position,
                total: self.count.get(),
                current: s.current().cloned(),
                done: s.done(),
                busy,
                undo_count: self.undo.lock().len(),
            },
            None => QueueStatus {
                total: self.count.get(),
                busy,
                ..QueueStatus::default()
            },
        }
    }
}

/// Claim on the single-operation gate. Dropping the permit releases the
/// lock and clears the busy flag in one step, on every exit path.
struct OpPermit<'a> {
    busy: &'a AtomicBool,
    _lock: tokio::sync::MutexGuard<'a, ()>,
}

impl Drop for OpPermit<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// Tests
// =============================================================================
