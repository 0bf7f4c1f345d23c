//! Structured error types for gridlayer.
//!
//! Coordinate translation and change tracking never fail at runtime (they use
//! `Option` sentinels); errors only surface from setup-time misuse and I/O.

/// All errors that can occur while configuring or loading a layer stack.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Setup-time contract violation (bad configuration, unsupported cache key).
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// JSON (de)serialization error from serde_json.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Persisted state entry that could not be interpreted.
    #[error("Invalid persisted state for `{key}`: {value}")]
    State {
        /// Property key.
        key: String,
        /// Offending raw value.
        value: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;
