//! Discord client errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the Discord client.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum DiscordError {
    /// The bot is not connected or the token was rejected
    #[error("No Discord connection: {message}")]
    NoConnection {
        /// Transport or authentication failure description
        message: String,
    },

    /// The configured guild is unknown to the bot
    #[error("Guild {guild_id} does not exist or is not visible to the bot")]
    GuildMissing {
        /// Guild snowflake
        guild_id: u64,
    },

    /// The user is not a member of the guild
    #[error("User {user_id} is not a member of the guild")]
    NotAMember {
        /// User snowflake
        user_id: u64,
    },

    /// The role is unknown in the guild
    #[error("Role {role_id} does not exist")]
    RoleMissing {
        /// Role snowflake
        role_id: u64,
    },

    /// The bot lacks a Discord permission for the action
    #[error("Missing Discord permission to {action}")]
    MissingPermission {
        /// Action that was attempted
        action: String,
    },

    /// Any other API failure
    #[error("Discord API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error body or message
        message: String,
    },
}

impl DiscordError {
    /// Check if this is a temporary error that may resolve on retry.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::NoConnection { .. } => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
