//! Game-side punishment records (bans and mutes).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which punishment list a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunishmentKind {
    Ban,
    Mute,
}

impl PunishmentKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::Mute => "mute",
        }
    }
}

impl fmt::Display for PunishmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An active punishment. `until == None` means permanent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Punishment {
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub punisher: Option<String>,
}

impl Punishment {
    pub fn permanent(reason: Option<String>, punisher: Option<String>) -> Self {
        Self { until: None, reason, punisher }
    }

    pub fn until(until: DateTime<Utc>, reason: Option<String>, punisher: Option<String>) -> Self {
        Self { until: Some(until), reason, punisher }
    }

    pub const fn is_permanent(&self) -> bool {
        self.until.is_none()
    }

    /// A punishment whose end lies in the past no longer counts as present.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.until.is_none_or(|until| until > now)
    }

    /// Remaining duration, `None` when permanent.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.until.map(|until| until - now)
    }
}
