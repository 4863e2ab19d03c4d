//! Sync kinds: each plugs its state accessors into the shared algorithm.

mod ban;
mod group;
mod mute;
mod nickname;
mod online_role;

pub use ban::BanSync;
pub use group::GroupSync;
pub use mute::MuteSync;
pub use nickname::NicknameSync;
pub use online_role::OnlineRoleSync;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use concord_types::{
    AppConfig, DiscordId, EntryOutcome, GenericSyncResult, ResolvedSomeone, SyncCause,
    SyncKind,
};

use super::collaborators::{Collaborators, DiscordClient, PlayerDirectory};
use super::reconcile::{EntryFailure, EntryResult, RunContext};

/// One sync kind, built from a config snapshot.
#[async_trait]
pub trait SyncModule: Send + Sync {
    fn kind(&self) -> SyncKind;

    fn is_enabled(&self) -> bool;

    /// Extra in-flight key for causes that reconcile only part of the kind.
    fn flight_scope(&self, _cause: &SyncCause) -> Option<String> {
        None
    }

    /// Reconcile every mapping entry the cause in `ctx` touches.
    async fn reconcile(&self, ctx: &RunContext<'_>) -> Vec<EntryOutcome>;
}

/// The modules of one config snapshot, keyed by kind.
pub type ModuleSet = BTreeMap<SyncKind, Arc<dyn SyncModule>>;

pub fn build_modules(config: &AppConfig, collaborators: &Collaborators) -> ModuleSet {
    let guild = config.discord.guild_id;
    let mut modules: ModuleSet = BTreeMap::new();
    modules.insert(
        SyncKind::Ban,
        Arc::new(BanSync::new(config.ban.clone(), guild, collaborators.clone())),
    );
    modules.insert(
        SyncKind::Mute,
        Arc::new(MuteSync::new(config.mute.clone(), guild, collaborators.clone())),
    );
    modules.insert(
        SyncKind::Group,
        Arc::new(GroupSync::new(config.groups.clone(), guild, collaborators.clone())),
    );
    modules.insert(
        SyncKind::Nickname,
        Arc::new(NicknameSync::new(config.nickname, guild, collaborators.clone())),
    );
    modules.insert(
        SyncKind::OnlineRole,
        Arc::new(OnlineRoleSync::new(config.online_role, guild, collaborators.clone())),
    );
    modules
}

/// A Discord client bound to the configured guild.
#[derive(Clone)]
pub(crate) struct GuildHandle {
    pub client: Arc<dyn DiscordClient>,
    pub guild: DiscordId,
}

impl GuildHandle {
    pub fn from_parts(
        client: Option<&Arc<dyn DiscordClient>>,
        guild: Option<DiscordId>,
    ) -> EntryResult<Self> {
        let client = client.ok_or_else(|| {
            EntryFailure::new(
                GenericSyncResult::NoDiscordConnection,
                "discord",
                "no Discord client configured",
            )
        })?;
        let guild = guild.ok_or_else(|| {
            EntryFailure::new(GenericSyncResult::InvalidConfig, "guild", "discord.guild_id is not set")
        })?;
        Ok(Self { client: Arc::clone(client), guild })
    }
}

pub(crate) fn player_directory(
    players: Option<&Arc<dyn PlayerDirectory>>,
) -> EntryResult<Arc<dyn PlayerDirectory>> {
    players.cloned().ok_or_else(|| {
        EntryFailure::new(GenericSyncResult::GameBackendFailed, "players", "no player directory")
    })
}

pub(crate) fn player_term(who: ResolvedSomeone) -> String {
    format!("player {}", who.game_id)
}

pub(crate) fn user_term(who: ResolvedSomeone) -> String {
    format!("Discord user {}", who.discord_id)
}
