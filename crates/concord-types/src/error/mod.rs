//! Typed error definitions for Concord.
//!
//! Every collaborator of the sync engine reports failures through one of the
//! enums below. The engine never lets them escape a resync: each is mapped to
//! a `SyncResult` at the call site. All errors are:
//!
//! - **Serializable** for API responses via serde
//! - **Displayable** for logging via Display trait
//! - **Matchable** for error handling logic via enum variants

mod backend;
mod config;
mod discord;
mod link;

pub use backend::BackendError;
pub use config::ConfigError;
pub use discord::DiscordError;
pub use link::LinkError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type that wraps all domain-specific errors.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "domain", content = "error")]
pub enum TypedError {
    /// Wraps a link store error
    #[error("Link store error: {0}")]
    Link(#[from] LinkError),

    /// Wraps a permission/punishment backend error
    #[error("Game backend error: {0}")]
    Backend(#[from] BackendError),

    /// Wraps a Discord client error
    #[error("Discord error: {0}")]
    Discord(#[from] DiscordError),

    /// Wraps a configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl TypedError {
    /// Check if retrying later could succeed without operator action.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Link(e) => e.is_transient(),
            Self::Backend(e) => e.is_transient(),
            Self::Discord(e) => e.is_transient(),
            Self::Config(_) => false,
        }
    }
}

/// Standard Result type using TypedError.
pub type Result<T> = std::result::Result<T, TypedError>;
