//! Configuration types.
//!
//! Defaults match the tuned values of the review queue; everything can be
//! overridden from `config.toml` in the sift config directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Engine tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Page size for queue refill fetches.
    pub page_size: usize,

    /// Buffer size below which a refill fetch is triggered.
    pub low_water: usize,

    /// Maximum number of buffered ids written to the progress record.
    /// Truncation on write only; reads trust whatever was persisted.
    pub persist_buffer_max: usize,

    /// Capacity of the undo stack. Oldest entries are evicted silently.
    pub undo_capacity: usize,

    /// Page size for the total-count enumeration.
    pub count_page_size: usize,

    /// Seconds before a cached total count is considered stale.
    pub count_staleness_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: 80,
            low_water: 20,
            persist_buffer_max: 120,
            undo_capacity: 5,
            count_page_size: 1000,
            count_staleness_secs: 24 * 60 * 60,
        }
    }
}

impl EngineConfig {
    /// Staleness window for the total-count cache.
    pub fn count_staleness(&self) -> Duration {
        Duration::from_secs(self.count_staleness_secs)
    }

    /// Load configuration from `config.toml`, falling back to defaults
    /// if the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path().ok_or(ConfigError::NoDataDir)?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(e.to_string()))?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Get the path to config.toml.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sift/config.toml"))
}

/// Get the data directory where queue state is persisted.
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("sift"))
}

/// Ensure the data directory exists.
pub fn ensure_data_dir() -> std::io::Result<()> {
    if let Some(dir) = data_dir() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}
