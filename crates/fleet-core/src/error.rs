//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant where they need to surface configuration problems.

use thiserror::Error;

/// Errors produced by `fleet-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `fleet-core`.
pub type CoreResult<T> = Result<T, CoreError>;
