//! Application State
//!
//! Holds the sync engine and where its configuration came from.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use concord_core::adapters::{sqlite, DiscordRest, GameBridge, SqliteLinkStore};
use concord_core::{Collaborators, SyncEngine};
use concord_types::AppConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub(crate) inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub engine: SyncEngine,
    pub config_path: PathBuf,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(engine: SyncEngine, config_path: PathBuf) -> Self {
        Self { inner: Arc::new(AppStateInner { engine, config_path, started_at: Instant::now() }) }
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.inner.engine
    }

    pub fn config_path(&self) -> &Path {
        &self.inner.config_path
    }

    pub fn uptime_secs(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }
}

/// Wire the platform adapters for `config` and build an engine on them.
///
/// The Discord client is left out when no token is configured; the engine then
/// reports `NO_DISCORD_CONNECTION` for every kind.
pub fn build_engine(config: AppConfig) -> Result<SyncEngine> {
    let links_path = sqlite::default_links_path()?;
    let links = Arc::new(SqliteLinkStore::open(&links_path)?);
    tracing::info!("[Links] using {}", links_path.display());

    let bridge = Arc::new(GameBridge::new(&config.bridge)?);
    let mut collaborators = Collaborators::new(links)
        .with_permissions(bridge.clone())
        .with_punishments(bridge.clone())
        .with_players(bridge);

    if config.discord.token.trim().is_empty() {
        tracing::warn!("[Discord] discord.token is not set, Discord side is unavailable");
    } else {
        collaborators = collaborators.with_discord(Arc::new(DiscordRest::new(&config.discord)?));
    }

    Ok(SyncEngine::new(config, collaborators))
}
