//! Application and sync-module configuration models.

mod app;
mod enums;
mod modules;

pub use app::{AppConfig, BridgeConfig, DiscordConfig, EngineConfig, ServerConfig, TimerConfig};
pub use enums::{Direction, Side, SyncKind, TieBreaker};
pub use modules::{
    BanSyncConfig, GroupPairConfig, GroupSyncConfig, MuteSyncConfig, NicknameSyncConfig,
    OnlineRoleConfig, DISCORD_TIMEOUT_CEILING_SECS,
};
