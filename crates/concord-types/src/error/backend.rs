//! Game-side backend errors (permissions, punishments, player directory).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the game-side integrations.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum BackendError {
    /// No integration is installed for the requested capability
    #[error("No integration available for {capability}")]
    NotAvailable {
        /// Name of the missing capability (e.g. "ban", "permissions")
        capability: String,
    },

    /// The backend rejected the operation
    #[error("Backend denied {operation}: {message}")]
    Denied {
        /// Operation that was attempted
        operation: String,
        /// Reason given by the backend
        message: String,
    },

    /// The referenced group does not exist in the permission backend
    #[error("Unknown group: {group}")]
    UnknownGroup {
        /// Group name
        group: String,
    },

    /// Transport or internal failure
    #[error("Backend failure: {message}")]
    Failed {
        /// Description of the failure
        message: String,
    },
}

impl BackendError {
    /// Check if this is a temporary error that may resolve on retry.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
