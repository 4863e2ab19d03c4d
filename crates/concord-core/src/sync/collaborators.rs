//! Async seams to the systems the engine mirrors between.
//!
//! Each trait is implemented by a platform adapter (`crate::adapters`). The
//! engine holds them as trait objects and never assumes a transport.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use concord_types::{
    BackendError, DiscordError, DiscordId, GameId, LinkError, Punishment, PunishmentKind,
    ResolvedSomeone, Someone, SyncCause, SyncReport,
};

/// Narrow key-value view of the account link storage.
#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn game_for_discord(&self, discord_id: DiscordId) -> Result<Option<GameId>, LinkError>;
    async fn discord_for_game(&self, game_id: GameId) -> Result<Option<DiscordId>, LinkError>;
    /// Every linked pair, for bulk resyncs.
    async fn linked_accounts(&self) -> Result<Vec<ResolvedSomeone>, LinkError>;
    async fn link(&self, pair: ResolvedSomeone) -> Result<(), LinkError>;
    /// Remove the link touching either side; returns the removed pair.
    async fn unlink(&self, who: Someone) -> Result<Option<ResolvedSomeone>, LinkError>;
}

/// Game-side permission groups, optionally scoped to a server context.
#[async_trait]
pub trait PermissionBackend: Send + Sync {
    async fn has_group(
        &self,
        player: GameId,
        group: &str,
        context: Option<&str>,
    ) -> Result<bool, BackendError>;
    async fn add_group(
        &self,
        player: GameId,
        group: &str,
        context: Option<&str>,
    ) -> Result<(), BackendError>;
    async fn remove_group(
        &self,
        player: GameId,
        group: &str,
        context: Option<&str>,
    ) -> Result<(), BackendError>;
}

/// Game-side bans and mutes.
#[async_trait]
pub trait PunishmentIntegration: Send + Sync {
    async fn get_punishment(
        &self,
        kind: PunishmentKind,
        player: GameId,
    ) -> Result<Option<Punishment>, BackendError>;
    async fn add_punishment(
        &self,
        kind: PunishmentKind,
        player: GameId,
        punishment: &Punishment,
    ) -> Result<(), BackendError>;
    async fn remove_punishment(
        &self,
        kind: PunishmentKind,
        player: GameId,
    ) -> Result<(), BackendError>;
}

/// Game-side presence and display names.
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    async fn is_online(&self, player: GameId) -> Result<bool, BackendError>;
    async fn online_players(&self) -> Result<Vec<GameId>, BackendError>;
    /// Custom display name; `None` when the account name is shown.
    async fn nickname(&self, player: GameId) -> Result<Option<String>, BackendError>;
    /// `None` resets to the account name.
    async fn set_nickname(&self, player: GameId, nickname: Option<&str>)
        -> Result<(), BackendError>;
}

/// An existing guild ban.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordBan {
    pub reason: Option<String>,
}

/// Guild-scoped Discord operations used by the sync kinds.
#[async_trait]
pub trait DiscordClient: Send + Sync {
    async fn role_exists(&self, guild: DiscordId, role: DiscordId) -> Result<bool, DiscordError>;
    async fn has_role(
        &self,
        guild: DiscordId,
        user: DiscordId,
        role: DiscordId,
    ) -> Result<bool, DiscordError>;
    async fn add_role(
        &self,
        guild: DiscordId,
        user: DiscordId,
        role: DiscordId,
    ) -> Result<(), DiscordError>;
    async fn remove_role(
        &self,
        guild: DiscordId,
        user: DiscordId,
        role: DiscordId,
    ) -> Result<(), DiscordError>;

    async fn get_ban(
        &self,
        guild: DiscordId,
        user: DiscordId,
    ) -> Result<Option<DiscordBan>, DiscordError>;
    async fn ban(
        &self,
        guild: DiscordId,
        user: DiscordId,
        reason: Option<&str>,
        delete_message_seconds: u32,
    ) -> Result<(), DiscordError>;
    async fn unban(&self, guild: DiscordId, user: DiscordId) -> Result<(), DiscordError>;

    /// End of the active timeout, if any.
    async fn get_timeout(
        &self,
        guild: DiscordId,
        user: DiscordId,
    ) -> Result<Option<DateTime<Utc>>, DiscordError>;
    async fn set_timeout(
        &self,
        guild: DiscordId,
        user: DiscordId,
        until: DateTime<Utc>,
        reason: Option<&str>,
    ) -> Result<(), DiscordError>;
    async fn clear_timeout(&self, guild: DiscordId, user: DiscordId) -> Result<(), DiscordError>;

    async fn nickname(
        &self,
        guild: DiscordId,
        user: DiscordId,
    ) -> Result<Option<String>, DiscordError>;
    async fn set_nickname(
        &self,
        guild: DiscordId,
        user: DiscordId,
        nickname: Option<&str>,
    ) -> Result<(), DiscordError>;
}

/// The single capability platform listeners and timers call.
#[async_trait]
pub trait DispatchTrigger: Send + Sync {
    /// Report a change or request for `who`. Returns one report per kind that
    /// ran; reactive causes matching an engine write are dropped.
    async fn notify_changed(&self, who: Someone, cause: SyncCause) -> Vec<SyncReport>;
}

/// The collaborator set an engine runs against.
///
/// Optional integrations that are missing turn into
/// `NO_*_INTEGRATION` / `NO_DISCORD_CONNECTION` results.
#[derive(Clone)]
pub struct Collaborators {
    pub links: Arc<dyn LinkStore>,
    pub discord: Option<Arc<dyn DiscordClient>>,
    pub permissions: Option<Arc<dyn PermissionBackend>>,
    pub punishments: Option<Arc<dyn PunishmentIntegration>>,
    pub players: Option<Arc<dyn PlayerDirectory>>,
}

impl Collaborators {
    pub fn new(links: Arc<dyn LinkStore>) -> Self {
        Self { links, discord: None, permissions: None, punishments: None, players: None }
    }

    #[must_use]
    pub fn with_discord(mut self, discord: Arc<dyn DiscordClient>) -> Self {
        self.discord = Some(discord);
        self
    }

    #[must_use]
    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionBackend>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    #[must_use]
    pub fn with_punishments(mut self, punishments: Arc<dyn PunishmentIntegration>) -> Self {
        self.punishments = Some(punishments);
        self
    }

    #[must_use]
    pub fn with_players(mut self, players: Arc<dyn PlayerDirectory>) -> Self {
        self.players = Some(players);
        self
    }
}
