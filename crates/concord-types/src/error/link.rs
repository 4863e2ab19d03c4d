//! Link store errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while querying or mutating account links.
///
/// "Not linked" is never an error: lookups return `Ok(None)` for that case so
/// callers can tell a storage outage apart from a missing link.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum LinkError {
    /// Backing storage could not be reached
    #[error("Link store unavailable: {message}")]
    Unavailable {
        /// Description of the storage failure
        message: String,
    },

    /// One side of the requested link is already linked elsewhere
    #[error("Account already linked: {account}")]
    AlreadyLinked {
        /// The account that already has a link
        account: String,
    },

    /// Stored data could not be decoded
    #[error("Corrupt link record: {message}")]
    Corrupt {
        /// Description of the decoding failure
        message: String,
    },
}

impl LinkError {
    /// Check if this is a temporary error that may resolve on retry.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
