//! Per-module sync configuration: directions, tie breakers, and pair mappings.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::enums::{Direction, TieBreaker};
use crate::models::DiscordId;

/// Discord caps a member timeout at 28 days.
pub const DISCORD_TIMEOUT_CEILING_SECS: i64 = 28 * 24 * 60 * 60;

/// Ban synchronization (game ban list ↔ guild bans).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct BanSyncConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_game_authoritative")]
    pub direction: Direction,
    #[serde(default)]
    pub tie_breaker: TieBreaker,
    /// Seconds of message history Discord deletes when banning (max 7 days)
    #[validate(range(max = 604_800_u32))]
    #[serde(default)]
    pub delete_message_seconds: u32,
    /// Punisher recorded on game bans created from Discord
    #[serde(default = "default_punisher")]
    pub punisher_name: String,
}

impl Default for BanSyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            direction: default_game_authoritative(),
            tie_breaker: TieBreaker::Game,
            delete_message_seconds: 0,
            punisher_name: default_punisher(),
        }
    }
}

/// Mute synchronization (game mutes ↔ guild member timeouts).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct MuteSyncConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_game_authoritative")]
    pub direction: Direction,
    #[serde(default)]
    pub tie_breaker: TieBreaker,
    /// Punisher recorded on game mutes created from Discord
    #[serde(default = "default_punisher")]
    pub punisher_name: String,
}

impl Default for MuteSyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            direction: default_game_authoritative(),
            tie_breaker: TieBreaker::Game,
            punisher_name: default_punisher(),
        }
    }
}

/// One permission group ↔ Discord role pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct GroupPairConfig {
    /// Permission group name on the game side
    #[validate(length(min = 1))]
    pub group: String,
    /// Discord role mirrored with the group
    pub role_id: DiscordId,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default = "default_discord_tie_breaker")]
    pub tie_breaker: TieBreaker,
    /// Optional permission context (e.g. a server name) the group applies in
    #[serde(default)]
    pub server_context: Option<String>,
}

impl GroupPairConfig {
    pub fn new(group: impl Into<String>, role_id: DiscordId) -> Self {
        Self {
            group: group.into(),
            role_id,
            direction: Direction::Bidirectional,
            tie_breaker: default_discord_tie_breaker(),
            server_context: None,
        }
    }

    /// Stable label identifying this pair in reports and loop-guard markers.
    pub fn label(&self) -> String {
        match &self.server_context {
            Some(ctx) => format!("{}@{}:{}", self.group, ctx, self.role_id),
            None => format!("{}:{}", self.group, self.role_id),
        }
    }
}

/// Group synchronization (permission groups ↔ Discord roles).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, Validate)]
pub struct GroupSyncConfig {
    #[serde(default)]
    pub enabled: bool,
    #[validate(nested)]
    #[serde(default)]
    pub pairs: Vec<GroupPairConfig>,
}

/// Nickname synchronization (game display name ↔ guild nickname).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct NicknameSyncConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_game_authoritative")]
    pub direction: Direction,
    #[serde(default)]
    pub tie_breaker: TieBreaker,
}

impl Default for NicknameSyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            direction: default_game_authoritative(),
            tie_breaker: TieBreaker::Game,
        }
    }
}

/// Online-role synchronization (online presence → Discord role).
///
/// The game is always authoritative: presence cannot be written from Discord.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Validate)]
pub struct OnlineRoleConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub role_id: Option<DiscordId>,
}

fn default_game_authoritative() -> Direction {
    Direction::GameAuthoritative
}

fn default_discord_tie_breaker() -> TieBreaker {
    TieBreaker::Discord
}

fn default_punisher() -> String {
    "Discord".to_string()
}
