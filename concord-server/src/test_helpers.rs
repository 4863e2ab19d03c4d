//! Test helpers for concord-server unit tests.

use std::sync::Arc;

use tempfile::TempDir;

use concord_core::adapters::memory::{
    MemoryDiscord, MemoryLinkStore, MemoryPermissions, MemoryPlayers, MemoryPunishments,
};
use concord_core::{Collaborators, SyncEngine};
use concord_types::models::{GroupPairConfig, OnlineRoleConfig};
use concord_types::{AppConfig, DiscordId, GameId, ResolvedSomeone};

use crate::state::AppState;

/// In-memory platforms behind a test `AppState`.
pub struct TestWorld {
    pub discord: Arc<MemoryDiscord>,
    pub permissions: Arc<MemoryPermissions>,
    pub punishments: Arc<MemoryPunishments>,
    pub players: Arc<MemoryPlayers>,
    pub links: Arc<MemoryLinkStore>,
    pub pair: ResolvedSomeone,
}

impl TestWorld {
    pub const GUILD: DiscordId = DiscordId(1000);
    pub const DONOR_ROLE: DiscordId = DiscordId(2001);
    pub const ONLINE_ROLE: DiscordId = DiscordId(2003);
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::new();
    config.discord.guild_id = Some(TestWorld::GUILD);
    config.ban.enabled = true;
    config.groups.enabled = true;
    config.groups.pairs = vec![GroupPairConfig::new("Donor", TestWorld::DONOR_ROLE)];
    config.online_role = OnlineRoleConfig { enabled: true, role_id: Some(TestWorld::ONLINE_ROLE) };
    config
}

/// Create a minimal `AppState` for testing.
///
/// Returns `(AppState, TestWorld, TempDir)`; the config file lives in the
/// `TempDir`, keep it alive for the test duration.
pub async fn test_app_state() -> (AppState, TestWorld, TempDir) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let config_path = temp_dir.path().join("concord.json");
    let config = test_config();
    concord_core::config::save_config_to(&config_path, &config)
        .expect("failed to write test config");

    let pair = ResolvedSomeone::new(GameId::random(), DiscordId(42));
    let links = Arc::new(MemoryLinkStore::with_links([pair]));
    let discord = Arc::new(MemoryDiscord::new(TestWorld::GUILD));
    discord.add_member(pair.discord_id);
    discord.create_role(TestWorld::DONOR_ROLE);
    discord.create_role(TestWorld::ONLINE_ROLE);
    let permissions = Arc::new(MemoryPermissions::new());
    let punishments = Arc::new(MemoryPunishments::new());
    let players = Arc::new(MemoryPlayers::new());

    let collaborators = Collaborators::new(links.clone())
        .with_discord(discord.clone())
        .with_permissions(permissions.clone())
        .with_punishments(punishments.clone())
        .with_players(players.clone());
    let state = AppState::new(SyncEngine::new(config, collaborators), config_path);

    (state, TestWorld { discord, permissions, punishments, players, links, pair }, temp_dir)
}
