//! Action Dispatcher
//!
//! Thin boundary mapping classified inputs to engine calls. The engine's
//! operation lock already serializes mutations; a command arriving while
//! one is in flight is dropped (the returned status reports `busy`), not
//! buffered. Jump targets are validated here, before any I/O, against the
//! cached total when one exists.

use std::sync::Arc;
use tokio::sync::watch;

use sift_core::{EngineError, QueueStatus, ReviewCommand};

use crate::count::TotalCountCache;
use crate::queue::QueueEngine;

/// Maps review commands onto the queue engine and total-count cache.
pub struct Dispatcher {
    engine: Arc<QueueEngine>,
    count: Arc<TotalCountCache>,
}

impl Dispatcher {
    /// Create a dispatcher over an engine and its count cache.
    pub fn new(engine: Arc<QueueEngine>, count: Arc<TotalCountCache>) -> Self {
        Self { engine, count }
    }

    /// Load persisted state (count cache first, then queue progress).
    pub async fn initialize(&self) -> Result<QueueStatus, EngineError> {
        self.count.load().await;
        self.engine.load_or_initialize().await
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<QueueStatus> {
        self.engine.subscribe()
    }

    /// Current status. Serves the cached total immediately and kicks off
    /// a background recount when it is absent or stale.
    pub fn status(&self) -> QueueStatus {
        let mut status = self.engine.status();
        status.total = self.count.get_or_refresh();
        status
    }

    /// Execute one command and return the resulting status.
    pub async fn handle(&self, command: ReviewCommand) -> Result<QueueStatus, EngineError> {
        tracing::debug!(?command, "Dispatching");
        match command {
            ReviewCommand::Skip => self.engine.skip().await,
            ReviewCommand::Trash => self.engine.trash_current().await,
            ReviewCommand::Undo => self.engine.undo_last().await,
            ReviewCommand::Jump { target } => {
                if target < 1 {
                    return Err(EngineError::InvalidJumpTarget { target });
                }
                // Optimistic bound check against the possibly-stale cached
                // total; a target the cache admits but the source no longer
                // holds clamps to the exhausted state downstream.
                if let Some(total) = self.count.get() {
                    if target as u64 > total {
                        return Err(EngineError::InvalidJumpTarget { target });
                    }
                }
                self.engine.jump_to((target - 1) as u64).await
            }
            ReviewCommand::Restart => self.engine.restart().await,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MemoryStore, ScriptedSource};
    use crate::store::CountRecord;
    use sift_core::{EngineConfig, ItemId};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn id(s: &str) -> ItemId {
        ItemId::from(s)
    }

    async fn dispatcher_over(
        items: usize,
    ) -> (Dispatcher, Arc<ScriptedSource>, Arc<MemoryStore>) {
        let source = Arc::new(ScriptedSource::sequential(items));
        let store = Arc::new(MemoryStore::new());
        let config = EngineConfig::default();
        let count = Arc::new(TotalCountCache::new(
            source.clone(),
            store.clone(),
            config.clone(),
        ));
        let engine = Arc::new(QueueEngine::new(
            source.clone(),
            store.clone(),
            count.clone(),
            config,
        ));
        let dispatcher = Dispatcher::new(engine, count);
        dispatcher.initialize().await.unwrap();
        (dispatcher, source, store)
    }

    #[tokio::test]
    async fn test_commands_drive_the_scenario() {
        let (dispatcher, _, _) = dispatcher_over(3).await;

        let s = dispatcher.handle(ReviewCommand::Skip).await.unwrap();
        assert_eq!(s.position, 1);

        let s = dispatcher.handle(ReviewCommand::Trash).await.unwrap();
        assert_eq!(s.position, 2);
        assert_eq!(s.current, Some(id("item-0002")));

        let s = dispatcher.handle(ReviewCommand::Undo).await.unwrap();
        assert_eq!(s.position, 1);
        assert_eq!(s.current, Some(id("item-0001")));

        dispatcher.handle(ReviewCommand::Skip).await.unwrap();
        let s = dispatcher.handle(ReviewCommand::Skip).await.unwrap();
        assert!(s.done);
        assert_eq!(s.position, 3);
    }

    #[tokio::test]
    async fn test_jump_rejects_below_one_before_io() {
        let (dispatcher, source, _) = dispatcher_over(100).await;
        let before = source.fetch_count();

        for target in [0, -3] {
            assert!(matches!(
                dispatcher.handle(ReviewCommand::Jump { target }).await,
                Err(EngineError::InvalidJumpTarget { .. })
            ));
        }
        assert_eq!(source.fetch_count(), before);
    }

    #[tokio::test]
    async fn test_jump_rejects_beyond_cached_total() {
        let (dispatcher, source, store) = dispatcher_over(100).await;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        store.seed_count(CountRecord {
            value: 100,
            computed_at_secs: now,
        });
        dispatcher.count.load().await;
        let before = source.fetch_count();

        assert!(matches!(
            dispatcher.handle(ReviewCommand::Jump { target: 101 }).await,
            Err(EngineError::InvalidJumpTarget { target: 101 })
        ));
        assert_eq!(source.fetch_count(), before);

        // The last item is a valid target
        let s = dispatcher
            .handle(ReviewCommand::Jump { target: 100 })
            .await
            .unwrap();
        assert_eq!(s.position, 99);
        assert_eq!(s.current, Some(id("item-0099")));
    }

    #[tokio::test]
    async fn test_jump_without_cached_total_is_optimistic() {
        let (dispatcher, _, _) = dispatcher_over(10).await;

        // No cached total: the bound check is skipped and the walk clamps
        let s = dispatcher
            .handle(ReviewCommand::Jump { target: 50 })
            .await
            .unwrap();
        assert!(s.done);
        assert_eq!(s.position, 10);
    }

    #[tokio::test]
    async fn test_restart_via_command() {
        let (dispatcher, _, store) = dispatcher_over(5).await;

        dispatcher.handle(ReviewCommand::Skip).await.unwrap();
        let s = dispatcher.handle(ReviewCommand::Restart).await.unwrap();
        assert_eq!(s.position, 0);
        assert_eq!(s.current, Some(id("item-0000")));
        assert!(store.progress_snapshot().is_some());
    }

    #[tokio::test]
    async fn test_status_reports_undo_count() {
        let (dispatcher, _, _) = dispatcher_over(10).await;

        dispatcher.handle(ReviewCommand::Skip).await.unwrap();
        dispatcher.handle(ReviewCommand::Trash).await.unwrap();
        assert_eq!(dispatcher.status().undo_count, 2);
    }
}
