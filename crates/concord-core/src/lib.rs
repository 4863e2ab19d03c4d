//! # Concord Core
//!
//! Sync engine and platform adapters for Concord.
//!
//! ## Layout
//!
//! ```text
//! concord-core/src/
//! ├── sync/
//! │   ├── collaborators.rs  # LinkStore, DiscordClient, game backend seams
//! │   ├── identity.rs       # Someone -> ResolvedSomeone via the link store
//! │   ├── guard.rs          # Loop suppression markers
//! │   ├── inflight.rs       # Single-flight per (kind, identity)
//! │   ├── reconcile.rs      # The shared read/decide/apply algorithm
//! │   ├── kinds/            # ban, mute, group, nickname, online_role
//! │   ├── engine.rs         # SyncEngine + DispatchTrigger
//! │   └── orchestrator.rs   # Bulk and timer resyncs
//! ├── adapters/             # Discord REST, game bridge, SQLite links, memory
//! ├── config.rs             # JSON config file in the data dir
//! ├── logging.rs            # tracing subscriber + daily file appender
//! └── metrics.rs            # Prometheus counters
//! ```

#![allow(
    clippy::significant_drop_tightening,
    reason = "Mutex guards in blocking closures are scoped by the closure"
)]
#![allow(clippy::map_err_ignore, reason = "Error context is provided in the replacement message")]
#![allow(
    clippy::redundant_type_annotations,
    reason = "Explicit types improve code clarity in complex async contexts"
)]
// Test-only lints: allow panic!, println!, etc. in test code
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::needless_collect,
        clippy::assertions_on_result_states
    )
)]

pub mod adapters;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod sync;

// Re-export commonly used types
pub use error::{AppError, AppResult};
pub use sync::{Collaborators, DispatchTrigger, LinkStore, ResyncRequest, SyncEngine};
