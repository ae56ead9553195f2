//! Core types for the sift media review queue.
//!
//! This crate contains shared data structures that are used across all sift crates:
//! - Item identifier and page types for the paginated source
//! - Queue status snapshots and review commands
//! - Gesture classification
//! - Configuration types
//! - Error types

mod config;
mod error;
mod gesture;
mod item;
mod status;

pub use config::{config_file_path, data_dir, ensure_data_dir, EngineConfig};
pub use error::{ConfigError, EngineError};
pub use gesture::{classify, Gesture};
pub use item::{Cursor, ItemId, Page};
pub use status::{QueueStatus, ReviewCommand};
