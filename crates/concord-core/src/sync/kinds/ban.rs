//! Ban sync: game ban list ↔ guild bans.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use concord_types::models::BanSyncConfig;
use concord_types::{
    BackendError, BanSyncResult, Direction, DiscordId, EntryOutcome, GenericSyncResult,
    Punishment, PunishmentKind, ResolvedSomeone, SyncKind, SyncResult, TieBreaker,
};

use super::{player_term, user_term, GuildHandle, SyncModule};
use crate::sync::collaborators::{Collaborators, PunishmentIntegration};
use crate::sync::reconcile::{reconcile_entry, EntryFailure, EntryResult, RunContext, SyncEntry};

pub struct BanSync {
    config: Arc<BanSyncConfig>,
    guild: Option<DiscordId>,
    collaborators: Collaborators,
}

impl BanSync {
    pub fn new(config: BanSyncConfig, guild: Option<DiscordId>, collaborators: Collaborators) -> Self {
        Self { config: Arc::new(config), guild, collaborators }
    }

    fn entry(&self, who: ResolvedSomeone) -> EntryResult<BanEntry> {
        let discord = GuildHandle::from_parts(self.collaborators.discord.as_ref(), self.guild)?;
        let punishments = self.collaborators.punishments.clone().ok_or_else(|| {
            EntryFailure::new(
                BanSyncResult::NoPunishmentIntegration,
                "punishments",
                "no punishment integration",
            )
        })?;
        Ok(BanEntry { config: Arc::clone(&self.config), who, discord, punishments })
    }
}

#[async_trait]
impl SyncModule for BanSync {
    fn kind(&self) -> SyncKind {
        SyncKind::Ban
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn reconcile(&self, ctx: &RunContext<'_>) -> Vec<EntryOutcome> {
        match self.entry(ctx.who) {
            Ok(entry) => reconcile_entry(&entry, ctx).await.into_iter().collect(),
            Err(failure) => {
                vec![failure.into_outcome(None, &player_term(ctx.who), &user_term(ctx.who))]
            },
        }
    }
}

struct BanEntry {
    config: Arc<BanSyncConfig>,
    who: ResolvedSomeone,
    discord: GuildHandle,
    punishments: Arc<dyn PunishmentIntegration>,
}

fn backend_failure(call: &'static str, err: &BackendError) -> EntryFailure {
    EntryFailure::backend(
        call,
        err,
        BanSyncResult::NoPunishmentIntegration.into(),
        GenericSyncResult::GameBackendFailed.into(),
    )
}

#[async_trait]
impl SyncEntry for BanEntry {
    /// Present or absent; the reason travels with a new ban.
    type State = Option<Punishment>;

    fn direction(&self) -> Direction {
        self.config.direction
    }

    fn tie_breaker(&self) -> TieBreaker {
        self.config.tie_breaker
    }

    fn terms(&self) -> (String, String) {
        (player_term(self.who), user_term(self.who))
    }

    fn agree(&self, game: &Self::State, discord: &Self::State) -> bool {
        game.is_some() == discord.is_some()
    }

    fn in_sync(&self, _state: &Self::State) -> SyncResult {
        SyncResult::ALREADY_IN_SYNC
    }

    async fn read_game(&self, who: ResolvedSomeone) -> EntryResult<Self::State> {
        let now = Utc::now();
        self.punishments
            .get_punishment(PunishmentKind::Ban, who.game_id)
            .await
            .map(|ban| ban.filter(|b| b.is_active_at(now)))
            .map_err(|e| backend_failure("get_punishment", &e))
    }

    async fn read_discord(&self, who: ResolvedSomeone) -> EntryResult<Self::State> {
        self.discord
            .client
            .get_ban(self.discord.guild, who.discord_id)
            .await
            .map(|ban| ban.map(|b| Punishment::permanent(b.reason, None)))
            .map_err(|e| EntryFailure::discord("get_ban", &e))
    }

    async fn apply_game(&self, who: ResolvedSomeone, source: &Self::State) -> EntryResult<SyncResult> {
        match source {
            Some(ban) => {
                let punishment = Punishment::permanent(
                    ban.reason.clone(),
                    Some(self.config.punisher_name.clone()),
                );
                self.punishments
                    .add_punishment(PunishmentKind::Ban, who.game_id, &punishment)
                    .await
                    .map_err(|e| backend_failure("add_punishment", &e))?;
                Ok(BanSyncResult::BanPlayer.into())
            },
            None => {
                self.punishments
                    .remove_punishment(PunishmentKind::Ban, who.game_id)
                    .await
                    .map_err(|e| backend_failure("remove_punishment", &e))?;
                Ok(BanSyncResult::UnbanPlayer.into())
            },
        }
    }

    async fn apply_discord(
        &self,
        who: ResolvedSomeone,
        source: &Self::State,
    ) -> EntryResult<SyncResult> {
        match source {
            Some(ban) => {
                self.discord
                    .client
                    .ban(
                        self.discord.guild,
                        who.discord_id,
                        ban.reason.as_deref(),
                        self.config.delete_message_seconds,
                    )
                    .await
                    .map_err(|e| EntryFailure::discord("ban", &e))?;
                Ok(BanSyncResult::BanUser.into())
            },
            None => {
                self.discord
                    .client
                    .unban(self.discord.guild, who.discord_id)
                    .await
                    .map_err(|e| EntryFailure::discord("unban", &e))?;
                Ok(BanSyncResult::UnbanUser.into())
            },
        }
    }
}
