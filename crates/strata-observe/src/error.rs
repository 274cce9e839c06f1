//! Errors from the observability layer.

use thiserror::Error;

/// Convenience alias for results within the observe crate.
pub type Result<T> = std::result::Result<T, ObserveError>;

/// Errors that can occur while rendering dumps.
#[derive(Debug, Error)]
pub enum ObserveError {
    #[error("unknown output format: '{name}'. Available formats: text, json")]
    UnknownFormat { name: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
