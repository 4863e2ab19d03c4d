//! Group sync: permission groups ↔ Discord roles, one entry per configured pair.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

use concord_types::models::{GroupPairConfig, GroupSyncConfig};
use concord_types::{
    BackendError, Direction, DiscordId, EntryOutcome, GenericSyncResult, GroupCause,
    GroupSyncResult, ResolvedSomeone, Side, SyncCause, SyncKind, SyncResult, TieBreaker,
};

use super::{GuildHandle, SyncModule};
use crate::sync::collaborators::{Collaborators, PermissionBackend};
use crate::sync::reconcile::{reconcile_entry, EntryFailure, EntryResult, RunContext, SyncEntry};

pub struct GroupSync {
    config: Arc<GroupSyncConfig>,
    guild: Option<DiscordId>,
    collaborators: Collaborators,
}

impl GroupSync {
    pub fn new(config: GroupSyncConfig, guild: Option<DiscordId>, collaborators: Collaborators) -> Self {
        Self { config: Arc::new(config), guild, collaborators }
    }

    /// Pairs a cause targets: all of them unless it names a role or group.
    fn targeted_pairs<'a>(&'a self, cause: &SyncCause) -> Vec<&'a GroupPairConfig> {
        self.config
            .pairs
            .iter()
            .filter(|pair| match cause {
                SyncCause::Group(GroupCause::DiscordRoleChanged { role_id }) => {
                    pair.role_id == *role_id
                },
                SyncCause::Group(GroupCause::GroupChanged { group }) => pair.group == *group,
                _ => true,
            })
            .collect()
    }

    fn handles(&self) -> EntryResult<(GuildHandle, Arc<dyn PermissionBackend>)> {
        let discord = GuildHandle::from_parts(self.collaborators.discord.as_ref(), self.guild)?;
        let permissions = self.collaborators.permissions.clone().ok_or_else(|| {
            EntryFailure::new(
                GroupSyncResult::NoPermissionIntegration,
                "permissions",
                "no permission integration",
            )
        })?;
        Ok((discord, permissions))
    }
}

#[async_trait]
impl SyncModule for GroupSync {
    fn kind(&self) -> SyncKind {
        SyncKind::Group
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Pair-targeted causes only run their pairs, so each target set gets its
    /// own in-flight slot.
    fn flight_scope(&self, cause: &SyncCause) -> Option<String> {
        match cause {
            SyncCause::Group(_) => {
                let labels: Vec<String> =
                    self.targeted_pairs(cause).iter().map(|pair| pair.label()).collect();
                Some(labels.join(","))
            },
            _ => None,
        }
    }

    async fn reconcile(&self, ctx: &RunContext<'_>) -> Vec<EntryOutcome> {
        let pairs = self.targeted_pairs(ctx.cause);
        if pairs.is_empty() {
            tracing::debug!("[GroupSync] no pair matches {} for {}", ctx.cause, ctx.who);
            return Vec::new();
        }

        let (discord, permissions) = match self.handles() {
            Ok(handles) => handles,
            Err(failure) => {
                return pairs
                    .into_iter()
                    .map(|pair| {
                        failure.clone().into_outcome(
                            Some(pair.label()),
                            &pair.group,
                            &pair.role_id.to_string(),
                        )
                    })
                    .collect();
            },
        };

        let entries: Vec<GroupEntry> = pairs
            .into_iter()
            .map(|pair| GroupEntry {
                pair: pair.clone(),
                discord: discord.clone(),
                permissions: Arc::clone(&permissions),
            })
            .collect();

        join_all(entries.iter().map(|entry| reconcile_entry(entry, ctx)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

struct GroupEntry {
    pair: GroupPairConfig,
    discord: GuildHandle,
    permissions: Arc<dyn PermissionBackend>,
}

fn backend_failure(call: &'static str, err: &BackendError) -> EntryFailure {
    EntryFailure::backend(
        call,
        err,
        GroupSyncResult::NoPermissionIntegration.into(),
        GroupSyncResult::PermissionBackendFailed.into(),
    )
}

#[async_trait]
impl SyncEntry for GroupEntry {
    /// Membership on either side
    type State = bool;

    fn label(&self) -> Option<String> {
        Some(self.pair.label())
    }

    fn direction(&self) -> Direction {
        self.pair.direction
    }

    fn tie_breaker(&self) -> TieBreaker {
        self.pair.tie_breaker
    }

    fn terms(&self) -> (String, String) {
        (self.pair.group.clone(), self.pair.role_id.to_string())
    }

    fn marker_entry(&self, side: Side) -> Option<String> {
        match side {
            Side::Game => Some(self.pair.group.clone()),
            Side::Discord => Some(self.pair.role_id.to_string()),
        }
    }

    fn agree(&self, game: &bool, discord: &bool) -> bool {
        game == discord
    }

    fn in_sync(&self, state: &bool) -> SyncResult {
        if *state {
            GroupSyncResult::BothTrue.into()
        } else {
            GroupSyncResult::BothFalse.into()
        }
    }

    async fn read_game(&self, who: ResolvedSomeone) -> EntryResult<bool> {
        self.permissions
            .has_group(who.game_id, &self.pair.group, self.pair.server_context.as_deref())
            .await
            .map_err(|e| backend_failure("has_group", &e))
    }

    async fn read_discord(&self, who: ResolvedSomeone) -> EntryResult<bool> {
        let client = &self.discord.client;
        let exists = client
            .role_exists(self.discord.guild, self.pair.role_id)
            .await
            .map_err(|e| EntryFailure::discord("role_exists", &e))?;
        if !exists {
            return Err(EntryFailure::new(
                GenericSyncResult::RoleDoesntExist,
                "role_exists",
                format!("role {} is not in the guild", self.pair.role_id),
            ));
        }
        client
            .has_role(self.discord.guild, who.discord_id, self.pair.role_id)
            .await
            .map_err(|e| EntryFailure::discord("has_role", &e))
    }

    async fn apply_game(&self, who: ResolvedSomeone, source: &bool) -> EntryResult<SyncResult> {
        let context = self.pair.server_context.as_deref();
        if *source {
            self.permissions
                .add_group(who.game_id, &self.pair.group, context)
                .await
                .map_err(|e| backend_failure("add_group", &e))?;
            Ok(GroupSyncResult::AddGame.into())
        } else {
            self.permissions
                .remove_group(who.game_id, &self.pair.group, context)
                .await
                .map_err(|e| backend_failure("remove_group", &e))?;
            Ok(GroupSyncResult::RemoveGame.into())
        }
    }

    async fn apply_discord(&self, who: ResolvedSomeone, source: &bool) -> EntryResult<SyncResult> {
        let client = &self.discord.client;
        if *source {
            client
                .add_role(self.discord.guild, who.discord_id, self.pair.role_id)
                .await
                .map_err(|e| EntryFailure::discord("add_role", &e))?;
            Ok(GroupSyncResult::AddDiscord.into())
        } else {
            client
                .remove_role(self.discord.guild, who.discord_id, self.pair.role_id)
                .await
                .map_err(|e| EntryFailure::discord("remove_role", &e))?;
            Ok(GroupSyncResult::RemoveDiscord.into())
        }
    }
}
