//! Error types for the sift review queue.

use thiserror::Error;

/// Engine errors - surfaced to the command surface.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Page source unreachable or returned a malformed response.
    /// Recoverable: queue state is unchanged and the call may be retried.
    #[error("Source fetch failed: {0}")]
    SourceFetch(String),

    /// Persistence failure on the commit path of a mutating operation.
    /// The in-memory state was not applied; the caller should retry.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Jump target rejected before any I/O (< 1 or beyond the known total).
    #[error("Invalid jump target: {target}")]
    InvalidJumpTarget { target: i64 },

    /// Engine has not been initialized yet.
    #[error("Queue not loaded")]
    NotLoaded,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No data directory could be resolved.
    #[error("Data directory not found")]
    NoDataDir,

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),
}
