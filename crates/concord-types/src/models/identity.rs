//! Game/Discord identities and the linked pair ("someone") used as the unit of
//! work for every sync attempt.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Game account identifier (player UUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub Uuid);

impl GameId {
    pub const fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GameId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Discord snowflake (user, role, or guild id).
///
/// Serialized as a string like the Discord API does; deserializes from either
/// a string or a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiscordId(pub u64);

impl DiscordId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DiscordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DiscordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

impl Serialize for DiscordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for DiscordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A fully resolved, linked identity pair. Never missing either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedSomeone {
    pub game_id: GameId,
    pub discord_id: DiscordId,
}

impl ResolvedSomeone {
    pub const fn new(game_id: GameId, discord_id: DiscordId) -> Self {
        Self { game_id, discord_id }
    }
}

impl fmt::Display for ResolvedSomeone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.game_id, self.discord_id)
    }
}

/// A possibly partial identity as supplied by a dispatch trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SomeoneFields", into = "SomeoneFields")]
pub enum Someone {
    /// Only the game account is known
    Game(GameId),
    /// Only the Discord account is known
    Discord(DiscordId),
    /// Both sides are known (no link lookup needed)
    Resolved(ResolvedSomeone),
}

impl Someone {
    pub const fn game(id: GameId) -> Self {
        Self::Game(id)
    }

    pub const fn discord(id: DiscordId) -> Self {
        Self::Discord(id)
    }

    pub const fn both(game_id: GameId, discord_id: DiscordId) -> Self {
        Self::Resolved(ResolvedSomeone::new(game_id, discord_id))
    }

    pub const fn game_id(&self) -> Option<GameId> {
        match self {
            Self::Game(id) => Some(*id),
            Self::Resolved(r) => Some(r.game_id),
            Self::Discord(_) => None,
        }
    }

    pub const fn discord_id(&self) -> Option<DiscordId> {
        match self {
            Self::Discord(id) => Some(*id),
            Self::Resolved(r) => Some(r.discord_id),
            Self::Game(_) => None,
        }
    }

    pub const fn as_resolved(&self) -> Option<ResolvedSomeone> {
        match self {
            Self::Resolved(r) => Some(*r),
            _ => None,
        }
    }
}

impl From<ResolvedSomeone> for Someone {
    fn from(value: ResolvedSomeone) -> Self {
        Self::Resolved(value)
    }
}

impl fmt::Display for Someone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Game(id) => write!(f, "game:{}", id),
            Self::Discord(id) => write!(f, "discord:{}", id),
            Self::Resolved(r) => write!(f, "{}", r),
        }
    }
}

/// Wire form of [`Someone`]: two optional fields, at least one present.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct SomeoneFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    game_id: Option<GameId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    discord_id: Option<DiscordId>,
}

impl TryFrom<SomeoneFields> for Someone {
    type Error = String;

    fn try_from(value: SomeoneFields) -> Result<Self, Self::Error> {
        match (value.game_id, value.discord_id) {
            (Some(g), Some(d)) => Ok(Self::both(g, d)),
            (Some(g), None) => Ok(Self::Game(g)),
            (None, Some(d)) => Ok(Self::Discord(d)),
            (None, None) => Err("identity needs a game_id, a discord_id, or both".to_string()),
        }
    }
}

impl From<Someone> for SomeoneFields {
    fn from(value: Someone) -> Self {
        Self { game_id: value.game_id(), discord_id: value.discord_id() }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_discord_id_accepts_string_and_number() {
        let a: DiscordId = serde_json::from_str("\"81384788765712384\"").unwrap();
        let b: DiscordId = serde_json::from_str("81384788765712384").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"81384788765712384\"");
    }

    #[test]
    fn test_someone_from_partial_fields() {
        let only_discord: Someone = serde_json::from_str(r#"{"discord_id":"5"}"#).unwrap();
        assert_eq!(only_discord, Someone::Discord(DiscordId(5)));
        assert!(only_discord.as_resolved().is_none());

        let err = serde_json::from_str::<Someone>("{}");
        assert!(err.is_err());
    }

    #[test]
    fn test_someone_both_is_resolved() {
        let game = GameId::random();
        let someone = Someone::both(game, DiscordId(9));
        let resolved = someone.as_resolved().unwrap();
        assert_eq!(resolved.game_id, game);
        assert_eq!(resolved.discord_id, DiscordId(9));

        let json = serde_json::to_value(someone).unwrap();
        assert_eq!(json["discord_id"], "9");
    }
}
