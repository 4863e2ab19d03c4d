//! Application-level configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::Validate;

use super::enums::SyncKind;
use super::modules::{
    BanSyncConfig, GroupSyncConfig, MuteSyncConfig, NicknameSyncConfig, OnlineRoleConfig,
};
use crate::error::ConfigError;
use crate::models::DiscordId;

/// Discord connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct DiscordConfig {
    /// Bot token (without the `Bot ` prefix)
    #[serde(default)]
    pub token: String,
    /// Guild whose state is mirrored
    #[serde(default)]
    pub guild_id: Option<DiscordId>,
    /// REST API base URL
    #[validate(url)]
    #[serde(default = "default_discord_api")]
    pub api_base_url: String,
    /// Per-request timeout in seconds
    #[validate(range(min = 1_u64, max = 300_u64))]
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            guild_id: None,
            api_base_url: default_discord_api(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Game-plugin HTTP bridge settings (permissions, punishments, presence).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct BridgeConfig {
    #[validate(url)]
    #[serde(default = "default_bridge_url")]
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[validate(range(min = 1_u64, max = 300_u64))]
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: default_bridge_url(),
            token: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Engine-wide tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct EngineConfig {
    /// Lifetime of a loop-suppression marker in milliseconds
    #[validate(range(min = 100_u64, max = 600_000_u64))]
    #[serde(default = "default_loop_guard_ttl")]
    pub loop_guard_ttl_ms: u64,
    /// Maximum concurrent resyncs during a bulk resync
    #[validate(range(min = 1_usize, max = 256_usize))]
    #[serde(default = "default_concurrency")]
    pub max_concurrency: usize,
    /// Log unlinked players on join at debug level only
    #[serde(default = "default_true")]
    pub quiet_unlinked_joins: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            loop_guard_ttl_ms: default_loop_guard_ttl(),
            max_concurrency: default_concurrency(),
            quiet_unlinked_joins: true,
        }
    }
}

/// Periodic resync of online players.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct TimerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[validate(range(min = 1_u32, max = 1440_u32))]
    #[serde(default = "default_timer_interval")]
    pub interval_minutes: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self { enabled: false, interval_minutes: default_timer_interval() }
    }
}

/// HTTP API listener.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Optional bearer token required by the HTTP API
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), api_key: None }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    #[serde(default)]
    pub discord: DiscordConfig,
    #[validate(nested)]
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[validate(nested)]
    #[serde(default)]
    pub engine: EngineConfig,
    #[validate(nested)]
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[validate(nested)]
    #[serde(default)]
    pub ban: BanSyncConfig,
    #[validate(nested)]
    #[serde(default)]
    pub mute: MuteSyncConfig,
    #[validate(nested)]
    #[serde(default)]
    pub groups: GroupSyncConfig,
    #[validate(nested)]
    #[serde(default)]
    pub nickname: NicknameSyncConfig,
    #[validate(nested)]
    #[serde(default)]
    pub online_role: OnlineRoleConfig,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn module_enabled(&self, kind: SyncKind) -> bool {
        match kind {
            SyncKind::Ban => self.ban.enabled,
            SyncKind::Mute => self.mute.enabled,
            SyncKind::Group => self.groups.enabled,
            SyncKind::Nickname => self.nickname.enabled,
            SyncKind::OnlineRole => self.online_role.enabled,
        }
    }

    pub fn any_module_enabled(&self) -> bool {
        SyncKind::ALL.iter().any(|kind| self.module_enabled(*kind))
    }

    /// Field-level checks plus the cross-field rules serde cannot express.
    pub fn validate_all(&self) -> Result<(), ConfigError> {
        self.validate().map_err(|e| ConfigError::invalid("config", e.to_string()))?;

        if self.any_module_enabled() && self.discord.guild_id.is_none() {
            return Err(ConfigError::invalid(
                "discord.guild_id",
                "a guild is required when any sync module is enabled",
            ));
        }

        let mut seen = HashSet::new();
        for pair in &self.groups.pairs {
            let key = (pair.group.as_str(), pair.role_id, pair.server_context.as_deref());
            if !seen.insert(key) {
                return Err(ConfigError::invalid(
                    "groups.pairs",
                    format!("duplicate pair {}", pair.label()),
                ));
            }
        }

        if self.online_role.enabled && self.online_role.role_id.is_none() {
            return Err(ConfigError::invalid(
                "online_role.role_id",
                "a role is required when online-role sync is enabled",
            ));
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_discord_api() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:8095".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_loop_guard_ttl() -> u64 {
    5_000
}

fn default_concurrency() -> usize {
    8
}

fn default_timer_interval() -> u32 {
    30
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8046
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::config::GroupPairConfig;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.engine.loop_guard_ttl_ms, 5_000);
        assert!(config.validate_all().is_ok());
    }

    #[test]
    fn test_duplicate_group_pairs_rejected() {
        let mut config = AppConfig::new();
        config.discord.guild_id = Some(DiscordId(1));
        config.groups.enabled = true;
        config.groups.pairs = vec![
            GroupPairConfig::new("donor", DiscordId(10)),
            GroupPairConfig::new("donor", DiscordId(10)),
        ];

        let err = config.validate_all().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "groups.pairs"));
    }

    #[test]
    fn test_enabled_module_requires_guild() {
        let mut config = AppConfig::new();
        config.ban.enabled = true;
        assert!(config.validate_all().is_err());

        config.discord.guild_id = Some(DiscordId(7));
        assert!(config.validate_all().is_ok());
    }

    #[test]
    fn test_zero_timer_interval_rejected() {
        let mut config = AppConfig::new();
        config.timer.interval_minutes = 0;
        assert!(config.validate_all().is_err());
    }
}
