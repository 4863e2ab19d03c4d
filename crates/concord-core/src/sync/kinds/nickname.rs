//! Nickname sync: game display name ↔ guild nickname.
//!
//! Compared case-sensitively. `None` on the game side means the account name
//! is shown; on the Discord side it means no guild nickname is set.

use async_trait::async_trait;
use std::sync::Arc;

use concord_types::models::NicknameSyncConfig;
use concord_types::{
    BackendError, Direction, DiscordId, EntryOutcome, GenericSyncResult, NicknameSyncResult,
    ResolvedSomeone, SyncKind, SyncResult, TieBreaker,
};

use super::{player_directory, GuildHandle, SyncModule};
use crate::sync::collaborators::{Collaborators, PlayerDirectory};
use crate::sync::reconcile::{reconcile_entry, EntryFailure, EntryResult, RunContext, SyncEntry};

/// Discord rejects guild nicknames longer than this many characters.
pub const DISCORD_NICKNAME_MAX_CHARS: usize = 32;

const GAME_TERM: &str = "game nickname";
const DISCORD_TERM: &str = "Discord nickname";

pub struct NicknameSync {
    config: NicknameSyncConfig,
    guild: Option<DiscordId>,
    collaborators: Collaborators,
}

impl NicknameSync {
    pub fn new(
        config: NicknameSyncConfig,
        guild: Option<DiscordId>,
        collaborators: Collaborators,
    ) -> Self {
        Self { config, guild, collaborators }
    }

    fn entry(&self) -> EntryResult<NicknameEntry> {
        let discord = GuildHandle::from_parts(self.collaborators.discord.as_ref(), self.guild)?;
        let players = player_directory(self.collaborators.players.as_ref())?;
        Ok(NicknameEntry { config: self.config, discord, players })
    }
}

#[async_trait]
impl SyncModule for NicknameSync {
    fn kind(&self) -> SyncKind {
        SyncKind::Nickname
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn reconcile(&self, ctx: &RunContext<'_>) -> Vec<EntryOutcome> {
        match self.entry() {
            Ok(entry) => reconcile_entry(&entry, ctx).await.into_iter().collect(),
            Err(failure) => vec![failure.into_outcome(None, GAME_TERM, DISCORD_TERM)],
        }
    }
}

struct NicknameEntry {
    config: NicknameSyncConfig,
    discord: GuildHandle,
    players: Arc<dyn PlayerDirectory>,
}

fn backend_failure(call: &'static str, err: &BackendError) -> EntryFailure {
    let failed: SyncResult = GenericSyncResult::GameBackendFailed.into();
    EntryFailure::backend(call, err, failed, failed)
}

#[async_trait]
impl SyncEntry for NicknameEntry {
    type State = Option<String>;

    fn direction(&self) -> Direction {
        self.config.direction
    }

    fn tie_breaker(&self) -> TieBreaker {
        self.config.tie_breaker
    }

    fn terms(&self) -> (String, String) {
        (GAME_TERM.to_string(), DISCORD_TERM.to_string())
    }

    fn agree(&self, game: &Self::State, discord: &Self::State) -> bool {
        game == discord
    }

    fn in_sync(&self, _state: &Self::State) -> SyncResult {
        NicknameSyncResult::Match.into()
    }

    async fn read_game(&self, who: ResolvedSomeone) -> EntryResult<Self::State> {
        self.players.nickname(who.game_id).await.map_err(|e| backend_failure("nickname", &e))
    }

    async fn read_discord(&self, who: ResolvedSomeone) -> EntryResult<Self::State> {
        self.discord
            .client
            .nickname(self.discord.guild, who.discord_id)
            .await
            .map_err(|e| EntryFailure::discord("nickname", &e))
    }

    async fn apply_game(&self, who: ResolvedSomeone, source: &Self::State) -> EntryResult<SyncResult> {
        self.players
            .set_nickname(who.game_id, source.as_deref())
            .await
            .map_err(|e| backend_failure("set_nickname", &e))?;
        Ok(NicknameSyncResult::SetGame.into())
    }

    async fn apply_discord(
        &self,
        who: ResolvedSomeone,
        source: &Self::State,
    ) -> EntryResult<SyncResult> {
        if let Some(nickname) = source {
            let length = nickname.chars().count();
            if length > DISCORD_NICKNAME_MAX_CHARS {
                return Err(EntryFailure::new(
                    NicknameSyncResult::NicknameTooLong,
                    "set_nickname",
                    format!("{:?} has {} characters", nickname, length),
                ));
            }
        }
        self.discord
            .client
            .set_nickname(self.discord.guild, who.discord_id, source.as_deref())
            .await
            .map_err(|e| EntryFailure::discord("set_nickname", &e))?;
        Ok(NicknameSyncResult::SetDiscord.into())
    }
}
