//! Unified error types for Concord Core.
//!
//! The sync engine itself never returns these: collaborator failures inside a
//! resync become typed `SyncResult`s. `AppError` covers adapters, config I/O,
//! and startup.

use serde::Serialize;
use thiserror::Error;

use concord_types::{ConfigError, LinkError};

/// Main error type for Concord operations outside the engine.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// Database operation failed (SQLite).
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Network request failed (HTTP client).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// File system I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Link store operation failed.
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// Logging could not be installed.
    #[error("Logging error: {0}")]
    Logging(String),

    /// Unclassified error with message.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// Result type alias for Concord operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<String> for AppError {
    fn from(s: String) -> Self {
        Self::Unknown(s)
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        Self::Unknown(s.to_string())
    }
}
