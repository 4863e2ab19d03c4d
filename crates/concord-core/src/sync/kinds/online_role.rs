//! Online-role sync: online presence → Discord role.
//!
//! Presence is read first. An offline player yields `PLAYER_NOT_ONLINE` without
//! any Discord read, except on quit, where presence is taken as offline and
//! the role is removed. Presence cannot be written, so the game side is
//! always authoritative.

use async_trait::async_trait;

use concord_types::models::OnlineRoleConfig;
use concord_types::{
    Direction, DiscordId, EntryOutcome, GenericSyncResult, OnlineRoleCause, OnlineRoleSyncResult,
    ResolvedSomeone, Side, SyncCause, SyncKind, SyncResult, TieBreaker,
};

use super::{player_directory, player_term, GuildHandle, SyncModule};
use crate::sync::collaborators::Collaborators;
use crate::sync::reconcile::{reconcile_entry, EntryFailure, EntryResult, RunContext, SyncEntry};

pub struct OnlineRoleSync {
    config: OnlineRoleConfig,
    guild: Option<DiscordId>,
    collaborators: Collaborators,
}

impl OnlineRoleSync {
    pub fn new(
        config: OnlineRoleConfig,
        guild: Option<DiscordId>,
        collaborators: Collaborators,
    ) -> Self {
        Self { config, guild, collaborators }
    }

    /// Presence for this cause; `Err` short-circuits the resync.
    async fn presence(&self, ctx: &RunContext<'_>) -> EntryResult<bool> {
        if matches!(ctx.cause, SyncCause::OnlineRole(OnlineRoleCause::PlayerQuit)) {
            return Ok(false);
        }
        let players = player_directory(self.collaborators.players.as_ref())?;
        let online = players.is_online(ctx.who.game_id).await.map_err(|e| {
            EntryFailure::new(GenericSyncResult::GameBackendFailed, "is_online", e)
        })?;
        if !online {
            return Err(EntryFailure::new(
                OnlineRoleSyncResult::PlayerNotOnline,
                "is_online",
                "player is offline",
            ));
        }
        Ok(true)
    }

    async fn entry(&self, ctx: &RunContext<'_>) -> EntryResult<OnlineEntry> {
        let role = self.config.role_id.ok_or_else(|| {
            EntryFailure::new(GenericSyncResult::InvalidConfig, "role", "online_role.role_id is not set")
        })?;
        let online = self.presence(ctx).await?;
        let discord = GuildHandle::from_parts(self.collaborators.discord.as_ref(), self.guild)?;
        Ok(OnlineEntry { who: ctx.who, online, role, discord })
    }
}

#[async_trait]
impl SyncModule for OnlineRoleSync {
    fn kind(&self) -> SyncKind {
        SyncKind::OnlineRole
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn reconcile(&self, ctx: &RunContext<'_>) -> Vec<EntryOutcome> {
        match self.entry(ctx).await {
            Ok(entry) => reconcile_entry(&entry, ctx).await.into_iter().collect(),
            Err(failure) => {
                let role = self.config.role_id.map(|r| r.to_string()).unwrap_or_default();
                vec![failure.into_outcome(None, &player_term(ctx.who), &role)]
            },
        }
    }
}

struct OnlineEntry {
    who: ResolvedSomeone,
    /// Presence already read for this call
    online: bool,
    role: DiscordId,
    discord: GuildHandle,
}

#[async_trait]
impl SyncEntry for OnlineEntry {
    type State = bool;

    fn direction(&self) -> Direction {
        Direction::GameAuthoritative
    }

    fn tie_breaker(&self) -> TieBreaker {
        TieBreaker::Game
    }

    fn terms(&self) -> (String, String) {
        (player_term(self.who), self.role.to_string())
    }

    fn marker_entry(&self, side: Side) -> Option<String> {
        match side {
            Side::Discord => Some(self.role.to_string()),
            Side::Game => None,
        }
    }

    fn agree(&self, game: &bool, discord: &bool) -> bool {
        game == discord
    }

    fn in_sync(&self, _state: &bool) -> SyncResult {
        SyncResult::ALREADY_IN_SYNC
    }

    async fn read_game(&self, _who: ResolvedSomeone) -> EntryResult<bool> {
        Ok(self.online)
    }

    async fn read_discord(&self, who: ResolvedSomeone) -> EntryResult<bool> {
        let client = &self.discord.client;
        let exists = client
            .role_exists(self.discord.guild, self.role)
            .await
            .map_err(|e| EntryFailure::discord("role_exists", &e))?;
        if !exists {
            return Err(EntryFailure::new(
                GenericSyncResult::RoleDoesntExist,
                "role_exists",
                format!("role {} is not in the guild", self.role),
            ));
        }
        client
            .has_role(self.discord.guild, who.discord_id, self.role)
            .await
            .map_err(|e| EntryFailure::discord("has_role", &e))
    }

    async fn apply_game(&self, _who: ResolvedSomeone, _source: &bool) -> EntryResult<SyncResult> {
        Err(EntryFailure::new(
            GenericSyncResult::InvalidConfig,
            "apply_game",
            "online presence cannot be written",
        ))
    }

    async fn apply_discord(&self, who: ResolvedSomeone, source: &bool) -> EntryResult<SyncResult> {
        let client = &self.discord.client;
        if *source {
            client
                .add_role(self.discord.guild, who.discord_id, self.role)
                .await
                .map_err(|e| EntryFailure::discord("add_role", &e))?;
            Ok(OnlineRoleSyncResult::AddRole.into())
        } else {
            client
                .remove_role(self.discord.guild, who.discord_id, self.role)
                .await
                .map_err(|e| EntryFailure::discord("remove_role", &e))?;
            Ok(OnlineRoleSyncResult::RemoveRole.into())
        }
    }
}
