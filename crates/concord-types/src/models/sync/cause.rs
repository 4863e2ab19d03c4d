//! Why a sync attempt started.
//!
//! Generic causes are shared by every sync kind. Kind-specific causes report a
//! change observed on one side; those are *reactive* and go through the loop
//! guard before a resync runs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::config::{Side, SyncKind};
use crate::models::DiscordId;

/// Causes any sync kind accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericCause {
    /// Programmatic call through the API
    Api,
    /// Operator resync command
    Command,
    /// Player joined the game server
    GameJoin,
    /// Accounts were linked
    Link,
    /// Accounts were unlinked
    Unlink,
    /// Periodic timer tick
    Timer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BanCause {
    GameBanChanged,
    DiscordBanChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuteCause {
    GameMuteChanged,
    DiscordTimeoutChanged,
}

/// Group causes name the pair member that changed so only matching pairs run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum GroupCause {
    DiscordRoleChanged { role_id: DiscordId },
    GroupChanged { group: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NicknameCause {
    GameNicknameChanged,
    DiscordNicknameChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnlineRoleCause {
    /// Player is leaving; presence is about to become offline
    PlayerQuit,
    DiscordRoleChanged,
}

/// Closed family of sync causes, composed from the generic set and one set per
/// kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "cause", rename_all = "snake_case")]
pub enum SyncCause {
    Generic(GenericCause),
    Ban(BanCause),
    Mute(MuteCause),
    Group(GroupCause),
    Nickname(NicknameCause),
    OnlineRole(OnlineRoleCause),
}

impl SyncCause {
    pub const API: Self = Self::Generic(GenericCause::Api);
    pub const COMMAND: Self = Self::Generic(GenericCause::Command);
    pub const GAME_JOIN: Self = Self::Generic(GenericCause::GameJoin);
    pub const LINK: Self = Self::Generic(GenericCause::Link);
    pub const UNLINK: Self = Self::Generic(GenericCause::Unlink);
    pub const TIMER: Self = Self::Generic(GenericCause::Timer);

    pub fn discord_role_changed(role_id: DiscordId) -> Self {
        Self::Group(GroupCause::DiscordRoleChanged { role_id })
    }

    pub fn group_changed(group: impl Into<String>) -> Self {
        Self::Group(GroupCause::GroupChanged { group: group.into() })
    }

    /// Human-readable label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Generic(GenericCause::Api) => "API call",
            Self::Generic(GenericCause::Command) => "Resync command",
            Self::Generic(GenericCause::GameJoin) => "Player joined",
            Self::Generic(GenericCause::Link) => "Accounts linked",
            Self::Generic(GenericCause::Unlink) => "Accounts unlinked",
            Self::Generic(GenericCause::Timer) => "Periodic resync",
            Self::Ban(BanCause::GameBanChanged) => "Game ban changed",
            Self::Ban(BanCause::DiscordBanChanged) => "Discord ban changed",
            Self::Mute(MuteCause::GameMuteChanged) => "Game mute changed",
            Self::Mute(MuteCause::DiscordTimeoutChanged) => "Discord timeout changed",
            Self::Group(GroupCause::DiscordRoleChanged { .. }) => "Discord role changed",
            Self::Group(GroupCause::GroupChanged { .. }) => "Permission group changed",
            Self::Nickname(NicknameCause::GameNicknameChanged) => "Game nickname changed",
            Self::Nickname(NicknameCause::DiscordNicknameChanged) => "Discord nickname changed",
            Self::OnlineRole(OnlineRoleCause::PlayerQuit) => "Player quit",
            Self::OnlineRole(OnlineRoleCause::DiscordRoleChanged) => "Online role changed",
        }
    }

    /// The single kind a kind-specific cause belongs to; `None` for generic causes.
    pub const fn kind(&self) -> Option<SyncKind> {
        match self {
            Self::Generic(_) => None,
            Self::Ban(_) => Some(SyncKind::Ban),
            Self::Mute(_) => Some(SyncKind::Mute),
            Self::Group(_) => Some(SyncKind::Group),
            Self::Nickname(_) => Some(SyncKind::Nickname),
            Self::OnlineRole(_) => Some(SyncKind::OnlineRole),
        }
    }

    pub fn applies_to(&self, kind: SyncKind) -> bool {
        self.kind().is_none_or(|own| own == kind)
    }

    /// The side this cause observed changing, if any.
    pub const fn origin_side(&self) -> Option<Side> {
        match self {
            Self::Generic(_) => None,
            Self::Ban(BanCause::GameBanChanged)
            | Self::Mute(MuteCause::GameMuteChanged)
            | Self::Group(GroupCause::GroupChanged { .. })
            | Self::Nickname(NicknameCause::GameNicknameChanged)
            | Self::OnlineRole(OnlineRoleCause::PlayerQuit) => Some(Side::Game),
            Self::Ban(BanCause::DiscordBanChanged)
            | Self::Mute(MuteCause::DiscordTimeoutChanged)
            | Self::Group(GroupCause::DiscordRoleChanged { .. })
            | Self::Nickname(NicknameCause::DiscordNicknameChanged)
            | Self::OnlineRole(OnlineRoleCause::DiscordRoleChanged) => Some(Side::Discord),
        }
    }

    /// Reactive causes report a change the engine itself could have produced.
    pub const fn is_reactive(&self) -> bool {
        self.origin_side().is_some()
    }

    pub const fn is_join(&self) -> bool {
        matches!(self, Self::Generic(GenericCause::GameJoin))
    }
}

impl fmt::Display for SyncCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(GroupCause::DiscordRoleChanged { role_id }) => {
                write!(f, "{} ({})", self.label(), role_id)
            },
            Self::Group(GroupCause::GroupChanged { group }) => {
                write!(f, "{} ({})", self.label(), group)
            },
            _ => f.write_str(self.label()),
        }
    }
}
