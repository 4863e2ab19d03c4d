//! Outcome of a sync attempt.
//!
//! Results are a closed family composed of a generic set and one set per kind.
//! Each result carries a message template where `%g` stands for the game-side
//! term and `%d` for the Discord-side term.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification used for summaries and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultCategory {
    /// A side was changed
    Updated,
    /// Both sides already agree
    InSync,
    /// Intentional no-op (wrong direction, module disabled)
    Skipped,
    /// The attempt failed to reach a consistent state
    Error,
}

impl ResultCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::InSync => "in_sync",
            Self::Skipped => "skipped",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ResultCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenericSyncResult {
    AlreadyInSync,
    WrongDirection,
    ModuleDisabled,
    NotLinked,
    LinkStoreUnavailable,
    NoDiscordConnection,
    GuildDoesntExist,
    NotAGuildMember,
    RoleDoesntExist,
    DiscordMissingPermission,
    DiscordRequestFailed,
    GameBackendFailed,
    InvalidConfig,
    InternalError,
}

impl GenericSyncResult {
    const fn code(&self) -> &'static str {
        match self {
            Self::AlreadyInSync => "ALREADY_IN_SYNC",
            Self::WrongDirection => "WRONG_DIRECTION",
            Self::ModuleDisabled => "MODULE_DISABLED",
            Self::NotLinked => "NOT_LINKED",
            Self::LinkStoreUnavailable => "LINK_STORE_UNAVAILABLE",
            Self::NoDiscordConnection => "NO_DISCORD_CONNECTION",
            Self::GuildDoesntExist => "GUILD_DOESNT_EXIST",
            Self::NotAGuildMember => "NOT_A_GUILD_MEMBER",
            Self::RoleDoesntExist => "ROLE_DOESNT_EXIST",
            Self::DiscordMissingPermission => "DISCORD_MISSING_PERMISSION",
            Self::DiscordRequestFailed => "DISCORD_REQUEST_FAILED",
            Self::GameBackendFailed => "GAME_BACKEND_FAILED",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    const fn template(&self) -> &'static str {
        match self {
            Self::AlreadyInSync => "%g and %d are already in sync",
            Self::WrongDirection => "Change came from the non-authoritative side, %g and %d left as is",
            Self::ModuleDisabled => "Sync module is disabled",
            Self::NotLinked => "Accounts are not linked",
            Self::LinkStoreUnavailable => "Link store is unavailable",
            Self::NoDiscordConnection => "Not connected to Discord",
            Self::GuildDoesntExist => "Configured guild does not exist",
            Self::NotAGuildMember => "User is not a member of the guild",
            Self::RoleDoesntExist => "Discord role %d does not exist",
            Self::DiscordMissingPermission => "Bot lacks the Discord permission to change %d",
            Self::DiscordRequestFailed => "Discord request for %d failed",
            Self::GameBackendFailed => "Game backend failed to read or change %g",
            Self::InvalidConfig => "Invalid configuration",
            Self::InternalError => "Internal error while synchronizing",
        }
    }

    const fn category(&self) -> ResultCategory {
        match self {
            Self::AlreadyInSync => ResultCategory::InSync,
            Self::WrongDirection | Self::ModuleDisabled => ResultCategory::Skipped,
            _ => ResultCategory::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BanSyncResult {
    BanUser,
    UnbanUser,
    BanPlayer,
    UnbanPlayer,
    NoPunishmentIntegration,
}

impl BanSyncResult {
    const fn code(&self) -> &'static str {
        match self {
            Self::BanUser => "BAN_USER",
            Self::UnbanUser => "UNBAN_USER",
            Self::BanPlayer => "BAN_PLAYER",
            Self::UnbanPlayer => "UNBAN_PLAYER",
            Self::NoPunishmentIntegration => "NO_PUNISHMENT_INTEGRATION",
        }
    }

    const fn template(&self) -> &'static str {
        match self {
            Self::BanUser => "Banned %d",
            Self::UnbanUser => "Unbanned %d",
            Self::BanPlayer => "Banned %g",
            Self::UnbanPlayer => "Unbanned %g",
            Self::NoPunishmentIntegration => "No ban integration is available for %g",
        }
    }

    const fn category(&self) -> ResultCategory {
        match self {
            Self::NoPunishmentIntegration => ResultCategory::Error,
            _ => ResultCategory::Updated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MuteSyncResult {
    TimeoutUser,
    RemoveTimeout,
    MutePlayer,
    UnmutePlayer,
    PunishmentTooLong,
    NoPunishmentIntegration,
}

impl MuteSyncResult {
    const fn code(&self) -> &'static str {
        match self {
            Self::TimeoutUser => "TIMEOUT_USER",
            Self::RemoveTimeout => "REMOVE_TIMEOUT",
            Self::MutePlayer => "MUTE_PLAYER",
            Self::UnmutePlayer => "UNMUTE_PLAYER",
            Self::PunishmentTooLong => "PUNISHMENT_TOO_LONG",
            Self::NoPunishmentIntegration => "NO_PUNISHMENT_INTEGRATION",
        }
    }

    const fn template(&self) -> &'static str {
        match self {
            Self::TimeoutUser => "Timed out %d",
            Self::RemoveTimeout => "Removed timeout from %d",
            Self::MutePlayer => "Muted %g",
            Self::UnmutePlayer => "Unmuted %g",
            Self::PunishmentTooLong => "Mute of %g exceeds the 28 day Discord timeout limit",
            Self::NoPunishmentIntegration => "No mute integration is available for %g",
        }
    }

    const fn category(&self) -> ResultCategory {
        match self {
            Self::PunishmentTooLong | Self::NoPunishmentIntegration => ResultCategory::Error,
            _ => ResultCategory::Updated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupSyncResult {
    BothTrue,
    BothFalse,
    AddGame,
    RemoveGame,
    AddDiscord,
    RemoveDiscord,
    PermissionBackendFailed,
    NoPermissionIntegration,
}

impl GroupSyncResult {
    const fn code(&self) -> &'static str {
        match self {
            Self::BothTrue => "BOTH_TRUE",
            Self::BothFalse => "BOTH_FALSE",
            Self::AddGame => "ADD_GAME",
            Self::RemoveGame => "REMOVE_GAME",
            Self::AddDiscord => "ADD_DISCORD",
            Self::RemoveDiscord => "REMOVE_DISCORD",
            Self::PermissionBackendFailed => "PERMISSION_BACKEND_FAILED",
            Self::NoPermissionIntegration => "NO_PERMISSION_INTEGRATION",
        }
    }

    const fn template(&self) -> &'static str {
        match self {
            Self::BothTrue => "Both %g and %d are present",
            Self::BothFalse => "Neither %g nor %d is present",
            Self::AddGame => "Added group %g",
            Self::RemoveGame => "Removed group %g",
            Self::AddDiscord => "Added role %d",
            Self::RemoveDiscord => "Removed role %d",
            Self::PermissionBackendFailed => "Permission backend failed for group %g",
            Self::NoPermissionIntegration => "No permission integration is available for %g",
        }
    }

    const fn category(&self) -> ResultCategory {
        match self {
            Self::BothTrue | Self::BothFalse => ResultCategory::InSync,
            Self::PermissionBackendFailed | Self::NoPermissionIntegration => ResultCategory::Error,
            _ => ResultCategory::Updated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NicknameSyncResult {
    Match,
    SetDiscord,
    SetGame,
    NicknameTooLong,
}

impl NicknameSyncResult {
    const fn code(&self) -> &'static str {
        match self {
            Self::Match => "MATCH",
            Self::SetDiscord => "SET_DISCORD",
            Self::SetGame => "SET_GAME",
            Self::NicknameTooLong => "NICKNAME_TOO_LONG",
        }
    }

    const fn template(&self) -> &'static str {
        match self {
            Self::Match => "%g matches %d",
            Self::SetDiscord => "Copied %g to %d",
            Self::SetGame => "Copied %d to %g",
            Self::NicknameTooLong => "%g exceeds the 32 character Discord nickname limit",
        }
    }

    const fn category(&self) -> ResultCategory {
        match self {
            Self::Match => ResultCategory::InSync,
            Self::SetDiscord | Self::SetGame => ResultCategory::Updated,
            Self::NicknameTooLong => ResultCategory::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnlineRoleSyncResult {
    AddRole,
    RemoveRole,
    PlayerNotOnline,
}

impl OnlineRoleSyncResult {
    const fn code(&self) -> &'static str {
        match self {
            Self::AddRole => "ADD_ROLE",
            Self::RemoveRole => "REMOVE_ROLE",
            Self::PlayerNotOnline => "PLAYER_NOT_ONLINE",
        }
    }

    const fn template(&self) -> &'static str {
        match self {
            Self::AddRole => "Gave online role %d",
            Self::RemoveRole => "Took online role %d",
            Self::PlayerNotOnline => "%g is not online",
        }
    }

    const fn category(&self) -> ResultCategory {
        match self {
            Self::PlayerNotOnline => ResultCategory::Error,
            _ => ResultCategory::Updated,
        }
    }
}

/// Closed family of sync results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "family", content = "code", rename_all = "snake_case")]
pub enum SyncResult {
    Generic(GenericSyncResult),
    Ban(BanSyncResult),
    Mute(MuteSyncResult),
    Group(GroupSyncResult),
    Nickname(NicknameSyncResult),
    OnlineRole(OnlineRoleSyncResult),
}

impl SyncResult {
    pub const ALREADY_IN_SYNC: Self = Self::Generic(GenericSyncResult::AlreadyInSync);
    pub const WRONG_DIRECTION: Self = Self::Generic(GenericSyncResult::WrongDirection);
    pub const NOT_LINKED: Self = Self::Generic(GenericSyncResult::NotLinked);

    /// Stable upper-snake-case code, e.g. `BAN_USER`.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Generic(r) => r.code(),
            Self::Ban(r) => r.code(),
            Self::Mute(r) => r.code(),
            Self::Group(r) => r.code(),
            Self::Nickname(r) => r.code(),
            Self::OnlineRole(r) => r.code(),
        }
    }

    /// Message template with `%g` / `%d` placeholders.
    pub const fn template(&self) -> &'static str {
        match self {
            Self::Generic(r) => r.template(),
            Self::Ban(r) => r.template(),
            Self::Mute(r) => r.template(),
            Self::Group(r) => r.template(),
            Self::Nickname(r) => r.template(),
            Self::OnlineRole(r) => r.template(),
        }
    }

    pub const fn category(&self) -> ResultCategory {
        match self {
            Self::Generic(r) => r.category(),
            Self::Ban(r) => r.category(),
            Self::Mute(r) => r.category(),
            Self::Group(r) => r.category(),
            Self::Nickname(r) => r.category(),
            Self::OnlineRole(r) => r.category(),
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self.category(), ResultCategory::Error)
    }

    pub const fn is_update(&self) -> bool {
        matches!(self.category(), ResultCategory::Updated)
    }

    /// Render the template with concrete game and Discord terms.
    pub fn format(&self, game_term: &str, discord_term: &str) -> String {
        self.template().replace("%g", game_term).replace("%d", discord_term)
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<GenericSyncResult> for SyncResult {
    fn from(value: GenericSyncResult) -> Self {
        Self::Generic(value)
    }
}

impl From<BanSyncResult> for SyncResult {
    fn from(value: BanSyncResult) -> Self {
        Self::Ban(value)
    }
}

impl From<MuteSyncResult> for SyncResult {
    fn from(value: MuteSyncResult) -> Self {
        Self::Mute(value)
    }
}

impl From<GroupSyncResult> for SyncResult {
    fn from(value: GroupSyncResult) -> Self {
        Self::Group(value)
    }
}

impl From<NicknameSyncResult> for SyncResult {
    fn from(value: NicknameSyncResult) -> Self {
        Self::Nickname(value)
    }
}

impl From<OnlineRoleSyncResult> for SyncResult {
    fn from(value: OnlineRoleSyncResult) -> Self {
        Self::OnlineRole(value)
    }
}
