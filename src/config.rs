//! Grid configuration.
//!
//! Everything is optional in JSON; missing fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Whether edits write through to the data source immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackingMode {
    /// Edits are written to the data source; discard writes the prior value back.
    #[default]
    Persistent,
    /// Edits are shadowed until saved; the data source is untouched.
    Temporary,
}

/// How pending edits identify their cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyStrategy {
    /// Column and row index; renumbered on both axes.
    #[default]
    Position,
    /// Column index and row identity; survives row moves in the data source.
    RowIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackingConfig {
    pub mode: TrackingMode,
    pub keys: KeyStrategy,
    pub track_row_inserts: bool,
    pub track_row_deletes: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            mode: TrackingMode::Persistent,
            keys: KeyStrategy::Position,
            track_row_inserts: true,
            track_row_deletes: true,
        }
    }
}

/// Background value cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    /// Keep serving the last value while a recomputation is pending.
    pub smooth_updates: bool,
    pub use_column_as_key: bool,
    pub use_row_as_key: bool,
    pub worker_threads: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            smooth_updates: true,
            use_column_as_key: true,
            use_row_as_key: true,
            worker_threads: 2,
        }
    }
}

/// Size of the visible window in positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewportConfig {
    pub visible_columns: usize,
    pub visible_rows: usize,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            visible_columns: 20,
            visible_rows: 50,
        }
    }
}

/// Top-level configuration of a body layer stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridConfig {
    /// Prefix of persisted property keys.
    pub state_prefix: String,
    pub tracking: TrackingConfig,
    pub cache: CacheConfig,
    pub viewport: ViewportConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            state_prefix: "grid".to_string(),
            tracking: TrackingConfig::default(),
            cache: CacheConfig::default(),
            viewport: ViewportConfig::default(),
        }
    }
}

impl GridConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    /// Returns an error for malformed JSON or an invalid configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for setup-time misuse.
    ///
    /// # Errors
    /// Returns [`GridError::Configuration`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.cache.worker_threads == 0 {
            return Err(GridError::Configuration(
                "cache.workerThreads must be at least 1".to_string(),
            ));
        }
        if self.viewport.visible_columns == 0 || self.viewport.visible_rows == 0 {
            return Err(GridError::Configuration(
                "viewport must show at least one column and one row".to_string(),
            ));
        }
        if self.state_prefix.contains(char::is_whitespace) {
            return Err(GridError::Configuration(format!(
                "statePrefix `{}` must not contain whitespace",
                self.state_prefix
            )));
        }
        Ok(())
    }
}
