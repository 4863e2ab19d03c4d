//! Mute sync: game mutes ↔ guild member timeouts.
//!
//! Discord caps a timeout at 28 days. A permanent or longer game mute is
//! reported as `PUNISHMENT_TOO_LONG` instead of being truncated.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;

use concord_types::models::config::{MuteSyncConfig, DISCORD_TIMEOUT_CEILING_SECS};
use concord_types::{
    BackendError, Direction, DiscordId, EntryOutcome, GenericSyncResult, MuteSyncResult,
    Punishment, PunishmentKind, ResolvedSomeone, SyncKind, SyncResult, TieBreaker,
};

use super::{player_term, user_term, GuildHandle, SyncModule};
use crate::sync::collaborators::{Collaborators, PunishmentIntegration};
use crate::sync::reconcile::{reconcile_entry, EntryFailure, EntryResult, RunContext, SyncEntry};

pub struct MuteSync {
    config: Arc<MuteSyncConfig>,
    guild: Option<DiscordId>,
    collaborators: Collaborators,
}

impl MuteSync {
    pub fn new(config: MuteSyncConfig, guild: Option<DiscordId>, collaborators: Collaborators) -> Self {
        Self { config: Arc::new(config), guild, collaborators }
    }

    fn entry(&self, who: ResolvedSomeone) -> EntryResult<MuteEntry> {
        let discord = GuildHandle::from_parts(self.collaborators.discord.as_ref(), self.guild)?;
        let punishments = self.collaborators.punishments.clone().ok_or_else(|| {
            EntryFailure::new(
                MuteSyncResult::NoPunishmentIntegration,
                "punishments",
                "no punishment integration",
            )
        })?;
        Ok(MuteEntry { config: Arc::clone(&self.config), who, discord, punishments })
    }
}

#[async_trait]
impl SyncModule for MuteSync {
    fn kind(&self) -> SyncKind {
        SyncKind::Mute
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

struct MuteEntry {
    config: Arc<MuteSyncConfig>,
    who: ResolvedSomeone,
    discord: GuildHandle,
    punishments: Arc<dyn PunishmentIntegration>,
}

fn backend_failure(call: &'static str, err: &BackendError) -> EntryFailure {
    EntryFailure::backend(
        call,
        err,
        MuteSyncResult::NoPunishmentIntegration.into(),
        GenericSyncResult::GameBackendFailed.into(),
    )
}

/// Reject mutes Discord cannot represent as a timeout.
fn check_timeout_length(mute: &Punishment) -> EntryResult<chrono::DateTime<Utc>> {
    let Some(until) = mute.until else {
        return Err(EntryFailure::new(
            MuteSyncResult::PunishmentTooLong,
            "set_timeout",
            "game mute is permanent",
        ));
    };
    let ceiling = Duration::seconds(DISCORD_TIMEOUT_CEILING_SECS);
    if until - Utc::now() > ceiling {
        return Err(EntryFailure::new(
            MuteSyncResult::PunishmentTooLong,
            "set_timeout",
            format!("game mute ends {}", until.to_rfc3339()),
        ));
    }
    Ok(until)
}

#[async_trait]
impl SyncEntry for MuteEntry {
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
            .get_punishment(PunishmentKind::Mute, who.game_id)
            .await
            .map(|mute| mute.filter(|m| m.is_active_at(now)))
            .map_err(|e| backend_failure("get_punishment", &e))
    }

    async fn read_discord(&self, who: ResolvedSomeone) -> EntryResult<Self::State> {
        let now = Utc::now();
        self.discord
            .client
            .get_timeout(self.discord.guild, who.discord_id)
            .await
            .map(|until| {
                until.filter(|u| *u > now).map(|u| Punishment::until(u, None, None))
            })
            .map_err(|e| EntryFailure::discord("get_timeout", &e))
    }

    async fn apply_game(&self, who: ResolvedSomeone, source: &Self::State) -> EntryResult<SyncResult> {
        match source {
            Some(timeout) => {
                let mute = Punishment {
                    until: timeout.until,
                    reason: timeout.reason.clone(),
                    punisher: Some(self.config.punisher_name.clone()),
                };
                self.punishments
                    .add_punishment(PunishmentKind::Mute, who.game_id, &mute)
                    .await
                    .map_err(|e| backend_failure("add_punishment", &e))?;
                Ok(MuteSyncResult::MutePlayer.into())
            },
            None => {
                self.punishments
                    .remove_punishment(PunishmentKind::Mute, who.game_id)
                    .await
                    .map_err(|e| backend_failure("remove_punishment", &e))?;
                Ok(MuteSyncResult::UnmutePlayer.into())
            },
        }
    }

    async fn apply_discord(
        &self,
        who: ResolvedSomeone,
        source: &Self::State,
    ) -> EntryResult<SyncResult> {
        match source {
            Some(mute) => {
                let until = check_timeout_length(mute)?;
                self.discord
                    .client
                    .set_timeout(self.discord.guild, who.discord_id, until, mute.reason.as_deref())
                    .await
                    .map_err(|e| EntryFailure::discord("set_timeout", &e))?;
                Ok(MuteSyncResult::TimeoutUser.into())
            },
            None => {
                self.discord
                    .client
                    .clear_timeout(self.discord.guild, who.discord_id)
                    .await
                    .map_err(|e| EntryFailure::discord("clear_timeout", &e))?;
                Ok(MuteSyncResult::RemoveTimeout.into())
            },
        }
    }
}
