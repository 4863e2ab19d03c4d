//! The bidirectional sync engine.
//!
//! ```text
//! notify_changed(fragment, cause)
//!   └─ resolve identity ─ NOT_LINKED / LINK_STORE_UNAVAILABLE
//!        └─ in-flight join per (kind, identity, scope, echo side)
//!             └─ module.reconcile → reconcile_entry per mapping entry
//!                  └─ loop guard: skip if the changed side still holds the engine write
//! ```

pub mod collaborators;
mod engine;
pub mod guard;
pub mod identity;
pub mod inflight;
pub mod kinds;
mod orchestrator;
pub mod reconcile;

#[cfg(test)]
mod tests;

pub use collaborators::{
    Collaborators, DiscordBan, DiscordClient, DispatchTrigger, LinkStore, PermissionBackend,
    PlayerDirectory, PunishmentIntegration,
};
pub use engine::{EngineSnapshot, SyncEngine};
pub use guard::LoopGuard;
pub use identity::{IdentityResolver, Resolution};
pub use orchestrator::ResyncRequest;
