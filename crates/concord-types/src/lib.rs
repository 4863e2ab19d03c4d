//! # Concord Types
//!
//! Core types, sync taxonomies, and error definitions for Concord.
//!
//! This crate provides the foundational type system shared by the engine and
//! the server:
//!
//! - **`error`** - Typed error hierarchy for the link store, game backends,
//!   Discord, and configuration
//! - **`models`** - Identities, punishments, configuration, and the
//!   cause/result tag families of the sync engine
//!
//! ## Architecture Role
//!
//! `concord-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!                concord-types (this crate)
//!                        │
//!                        ▼
//!                  concord-core
//!                        │
//!                        ▼
//!                 concord-server
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde for the HTTP API and config file
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{BackendError, ConfigError, DiscordError, LinkError, Result, TypedError};

// Re-export core model types
pub use models::{
    AppConfig, BanCause, BanSyncResult, DiscordId, Direction, EntryOutcome, GameId, GenericCause,
    GenericSyncResult, GroupCause, GroupSyncResult, MuteCause, MuteSyncResult, NicknameCause,
    NicknameSyncResult, OnlineRoleCause, OnlineRoleSyncResult, Punishment, PunishmentKind,
    ResolvedSomeone, ResultCategory, ResyncFailure, ResyncStatus, ResyncSummary, Side, Someone,
    SyncCause, SyncKind, SyncReport, SyncResult, TieBreaker,
};
