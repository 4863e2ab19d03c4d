//! Configuration enums for sync kinds and direction of truth.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One side of a mirrored property.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Game,
    Discord,
}

impl Side {
    pub const fn opposite(self) -> Self {
        match self {
            Self::Game => Self::Discord,
            Self::Discord => Self::Game,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Discord => "discord",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side is the source of truth for a mapping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Discord wins; the game side is only ever written to
    DiscordAuthoritative,
    /// The game wins; Discord is only ever written to
    GameAuthoritative,
    /// Either side may win (the changed side, else the tie breaker)
    #[default]
    Bidirectional,
}

impl Direction {
    /// The authoritative side, `None` for bidirectional mappings.
    pub const fn authoritative_side(self) -> Option<Side> {
        match self {
            Self::DiscordAuthoritative => Some(Side::Discord),
            Self::GameAuthoritative => Some(Side::Game),
            Self::Bidirectional => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::DiscordAuthoritative => write!(f, "discord_authoritative"),
            Self::GameAuthoritative => write!(f, "game_authoritative"),
            Self::Bidirectional => write!(f, "bidirectional"),
        }
    }
}

/// Side that wins a bidirectional divergence when the cause does not name the
/// changed side (timer, command, join, API).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TieBreaker {
    #[default]
    Game,
    Discord,
}

impl TieBreaker {
    pub const fn side(self) -> Side {
        match self {
            Self::Game => Side::Game,
            Self::Discord => Side::Discord,
        }
    }
}

/// The kinds of mirrored state, one sync module each.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    Ban,
    Mute,
    Group,
    Nickname,
    OnlineRole,
}

impl SyncKind {
    pub const ALL: [Self; 5] = [Self::Ban, Self::Mute, Self::Group, Self::Nickname, Self::OnlineRole];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::Mute => "mute",
            Self::Group => "group",
            Self::Nickname => "nickname",
            Self::OnlineRole => "online_role",
        }
    }

    /// Log prefix used by the module, e.g. `[BanSync]`.
    pub const fn log_tag(&self) -> &'static str {
        match self {
            Self::Ban => "[BanSync]",
            Self::Mute => "[MuteSync]",
            Self::Group => "[GroupSync]",
            Self::Nickname => "[NicknameSync]",
            Self::OnlineRole => "[OnlineRoleSync]",
        }
    }
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "ban" | "bans" => Ok(Self::Ban),
            "mute" | "mutes" => Ok(Self::Mute),
            "group" | "groups" => Ok(Self::Group),
            "nickname" | "nicknames" => Ok(Self::Nickname),
            "online_role" | "online" => Ok(Self::OnlineRole),
            _ => Err(format!("Unknown sync kind: {s}")),
        }
    }
}
