//! Review-queue engine for the sift media review queue.
//!
//! The engine walks an externally-paginated media source one item at a
//! time: each item is either skipped (kept) or trashed (soft-deleted and
//! hidden). It maintains a small lookahead buffer, persists minimal
//! progress so a restart resumes where it left off, keeps a bounded undo
//! history, and supports jumping to an absolute position without
//! replaying history.
//!
//! ## Layout
//!
//! - [`PageSource`] / [`StateStore`] - seams to the media source and the
//!   key-value persistence, consumed as `Arc<dyn _>`
//! - [`QueueEngine`] - position, lookahead buffer, continuation cursor,
//!   refill policy, and the jump/rebuild algorithm
//! - [`UndoStack`] - bounded history of the last N advancing actions
//! - [`TotalCountCache`] - staleness-gated background full enumeration
//! - [`Dispatcher`] - thin command boundary above the engine

mod count;
mod dispatcher;
mod queue;
mod source;
mod store;
mod trash;
mod undo;

#[cfg(test)]
pub(crate) mod mock;

pub use count::TotalCountCache;
pub use dispatcher::Dispatcher;
pub use queue::{refill, QueueEngine, QueueState};
pub use source::PageSource;
pub use store::{CountRecord, ProgressRecord, StateStore};
pub use trash::TrashSet;
pub use undo::{UndoEntry, UndoStack};
