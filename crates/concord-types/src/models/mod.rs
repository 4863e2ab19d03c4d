//! Core domain models for Concord.
//!
//! This module contains all shared data structures used by the engine, the
//! adapters, and the server.

pub mod config;
mod identity;
mod punishment;
pub mod sync;

// Re-export all models
pub use config::{
    AppConfig, BanSyncConfig, BridgeConfig, DiscordConfig, Direction, EngineConfig,
    GroupPairConfig, GroupSyncConfig, MuteSyncConfig, NicknameSyncConfig, OnlineRoleConfig,
    ServerConfig, Side, SyncKind, TieBreaker, TimerConfig,
};
pub use identity::{DiscordId, GameId, ResolvedSomeone, Someone};
pub use punishment::{Punishment, PunishmentKind};
pub use sync::{
    BanCause, BanSyncResult, EntryOutcome, GenericCause, GenericSyncResult, GroupCause,
    GroupSyncResult, MuteCause, MuteSyncResult, NicknameCause, NicknameSyncResult,
    OnlineRoleCause, OnlineRoleSyncResult, ResultCategory, ResyncFailure, ResyncStatus,
    ResyncSummary, SyncCause, SyncReport, SyncResult,
};
