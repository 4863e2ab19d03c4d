//! In-memory collaborators with call counters.
//!
//! Used by the engine's tests and by server handler tests; every read and
//! write is counted so a test can assert which accessors ran.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use concord_types::{
    BackendError, DiscordError, DiscordId, GameId, LinkError, Punishment, PunishmentKind,
    ResolvedSomeone, Someone,
};

use crate::sync::collaborators::{
    DiscordBan, DiscordClient, LinkStore, PermissionBackend, PlayerDirectory,
    PunishmentIntegration,
};

/// Read and write counters shared by the memory collaborators.
#[derive(Default)]
pub struct CallCounter {
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl CallCounter {
    fn read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }

    fn write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.reads() + self.writes()
    }
}

// ===== Link store =====

#[derive(Default)]
pub struct MemoryLinkStore {
    links: Mutex<Vec<ResolvedSomeone>>,
    unavailable: AtomicBool,
    failing_players: Mutex<HashSet<GameId>>,
    lookups: AtomicUsize,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_links(links: impl IntoIterator<Item = ResolvedSomeone>) -> Self {
        let store = Self::new();
        store.links.lock().extend(links);
        store
    }

    pub fn insert(&self, pair: ResolvedSomeone) {
        self.links.lock().push(pair);
    }

    /// Make every call fail with `LinkError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make `discord_for_game` fail for one player only.
    pub fn fail_lookups_for(&self, player: GameId) {
        self.failing_players.lock().insert(player);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), LinkError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LinkError::Unavailable { message: "memory store offline".to_string() });
        }
        Ok(())
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn game_for_discord(&self, discord_id: DiscordId) -> Result<Option<GameId>, LinkError> {
        self.check()?;
        Ok(self.links.lock().iter().find(|l| l.discord_id == discord_id).map(|l| l.game_id))
    }

    async fn discord_for_game(&self, game_id: GameId) -> Result<Option<DiscordId>, LinkError> {
        self.check()?;
        if self.failing_players.lock().contains(&game_id) {
            return Err(LinkError::Unavailable { message: format!("lookup for {} timed out", game_id) });
        }
        Ok(self.links.lock().iter().find(|l| l.game_id == game_id).map(|l| l.discord_id))
    }

    async fn linked_accounts(&self) -> Result<Vec<ResolvedSomeone>, LinkError> {
        self.check()?;
        Ok(self.links.lock().clone())
    }

    async fn link(&self, pair: ResolvedSomeone) -> Result<(), LinkError> {
        self.check()?;
        let mut links = self.links.lock();
        if let Some(existing) =
            links.iter().find(|l| l.game_id == pair.game_id || l.discord_id == pair.discord_id)
        {
            return Err(LinkError::AlreadyLinked { account: existing.to_string() });
        }
        links.push(pair);
        Ok(())
    }

    async fn unlink(&self, who: Someone) -> Result<Option<ResolvedSomeone>, LinkError> {
        self.check()?;
        let mut links = self.links.lock();
        let position = links.iter().position(|l| {
            who.game_id() == Some(l.game_id) || who.discord_id() == Some(l.discord_id)
        });
        Ok(position.map(|i| links.remove(i)))
    }
}

// ===== Discord =====

#[derive(Default)]
struct GuildState {
    roles: HashSet<DiscordId>,
    members: HashSet<DiscordId>,
    member_roles: HashSet<(DiscordId, DiscordId)>,
    bans: HashMap<DiscordId, Option<String>>,
    timeouts: HashMap<DiscordId, DateTime<Utc>>,
    nicknames: HashMap<DiscordId, String>,
}

/// A single guild held in memory.
pub struct MemoryDiscord {
    guild: DiscordId,
    state: Mutex<GuildState>,
    failure: Mutex<Option<DiscordError>>,
    read_delay: Mutex<Option<Duration>>,
    pub calls: CallCounter,
}

impl MemoryDiscord {
    pub fn new(guild: DiscordId) -> Self {
        Self {
            guild,
            state: Mutex::new(GuildState::default()),
            failure: Mutex::new(None),
            read_delay: Mutex::new(None),
            calls: CallCounter::default(),
        }
    }

    pub fn add_member(&self, user: DiscordId) {
        self.state.lock().members.insert(user);
    }

    pub fn create_role(&self, role: DiscordId) {
        self.state.lock().roles.insert(role);
    }

    pub fn give_role(&self, user: DiscordId, role: DiscordId) {
        let mut state = self.state.lock();
        state.roles.insert(role);
        state.member_roles.insert((user, role));
    }

    pub fn user_has_role(&self, user: DiscordId, role: DiscordId) -> bool {
        self.state.lock().member_roles.contains(&(user, role))
    }

    pub fn ban_user(&self, user: DiscordId, reason: Option<&str>) {
        self.state.lock().bans.insert(user, reason.map(str::to_string));
    }

    pub fn ban_reason(&self, user: DiscordId) -> Option<Option<String>> {
        self.state.lock().bans.get(&user).cloned()
    }

    pub fn timeout_user(&self, user: DiscordId, until: DateTime<Utc>) {
        self.state.lock().timeouts.insert(user, until);
    }

    pub fn timeout_of(&self, user: DiscordId) -> Option<DateTime<Utc>> {
        self.state.lock().timeouts.get(&user).copied()
    }

    pub fn set_user_nickname(&self, user: DiscordId, nickname: &str) {
        self.state.lock().nicknames.insert(user, nickname.to_string());
    }

    pub fn nickname_of(&self, user: DiscordId) -> Option<String> {
        self.state.lock().nicknames.get(&user).cloned()
    }

    /// Fail every following call with `err` (or stop failing with `None`).
    pub fn fail_with(&self, err: Option<DiscordError>) {
        *self.failure.lock() = err;
    }

    /// Delay every read, to widen race windows in concurrency tests.
    pub fn set_read_delay(&self, delay: Option<Duration>) {
        *self.read_delay.lock() = delay;
    }

    async fn begin_read(&self, guild: DiscordId) -> Result<(), DiscordError> {
        self.calls.read();
        let delay = *self.read_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check(guild)
    }

    fn begin_write(&self, guild: DiscordId) -> Result<(), DiscordError> {
        self.calls.write();
        self.check(guild)
    }

    fn check(&self, guild: DiscordId) -> Result<(), DiscordError> {
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        if guild != self.guild {
            return Err(DiscordError::GuildMissing { guild_id: guild.get() });
        }
        Ok(())
    }

    fn require_member(&self, user: DiscordId) -> Result<(), DiscordError> {
        if self.state.lock().members.contains(&user) {
            Ok(())
        } else {
            Err(DiscordError::NotAMember { user_id: user.get() })
        }
    }
}

#[async_trait]
impl DiscordClient for MemoryDiscord {
    async fn role_exists(&self, guild: DiscordId, role: DiscordId) -> Result<bool, DiscordError> {
        self.begin_read(guild).await?;
        Ok(self.state.lock().roles.contains(&role))
    }

    async fn has_role(
        &self,
        guild: DiscordId,
        user: DiscordId,
        role: DiscordId,
    ) -> Result<bool, DiscordError> {
        self.begin_read(guild).await?;
        self.require_member(user)?;
        Ok(self.state.lock().member_roles.contains(&(user, role)))
    }

    async fn add_role(
        &self,
        guild: DiscordId,
        user: DiscordId,
        role: DiscordId,
    ) -> Result<(), DiscordError> {
        self.begin_write(guild)?;
        self.require_member(user)?;
        let mut state = self.state.lock();
        if !state.roles.contains(&role) {
            return Err(DiscordError::RoleMissing { role_id: role.get() });
        }
        state.member_roles.insert((user, role));
        Ok(())
    }

    async fn remove_role(
        &self,
        guild: DiscordId,
        user: DiscordId,
        role: DiscordId,
    ) -> Result<(), DiscordError> {
        self.begin_write(guild)?;
        self.require_member(user)?;
        self.state.lock().member_roles.remove(&(user, role));
        Ok(())
    }

    async fn get_ban(
        &self,
        guild: DiscordId,
        user: DiscordId,
    ) -> Result<Option<DiscordBan>, DiscordError> {
        self.begin_read(guild).await?;
        Ok(self.state.lock().bans.get(&user).map(|reason| DiscordBan { reason: reason.clone() }))
    }

    async fn ban(
        &self,
        guild: DiscordId,
        user: DiscordId,
        reason: Option<&str>,
        _delete_message_seconds: u32,
    ) -> Result<(), DiscordError> {
        self.begin_write(guild)?;
        self.state.lock().bans.insert(user, reason.map(str::to_string));
        Ok(())
    }

    async fn unban(&self, guild: DiscordId, user: DiscordId) -> Result<(), DiscordError> {
        self.begin_write(guild)?;
        self.state.lock().bans.remove(&user);
        Ok(())
    }

    async fn get_timeout(
        &self,
        guild: DiscordId,
        user: DiscordId,
    ) -> Result<Option<DateTime<Utc>>, DiscordError> {
        self.begin_read(guild).await?;
        self.require_member(user)?;
        Ok(self.state.lock().timeouts.get(&user).copied())
    }

    async fn set_timeout(
        &self,
        guild: DiscordId,
        user: DiscordId,
        until: DateTime<Utc>,
        _reason: Option<&str>,
    ) -> Result<(), DiscordError> {
        self.begin_write(guild)?;
        self.require_member(user)?;
        self.state.lock().timeouts.insert(user, until);
        Ok(())
    }

    async fn clear_timeout(&self, guild: DiscordId, user: DiscordId) -> Result<(), DiscordError> {
        self.begin_write(guild)?;
        self.require_member(user)?;
        self.state.lock().timeouts.remove(&user);
        Ok(())
    }

    async fn nickname(
        &self,
        guild: DiscordId,
        user: DiscordId,
    ) -> Result<Option<String>, DiscordError> {
        self.begin_read(guild).await?;
        self.require_member(user)?;
        Ok(self.state.lock().nicknames.get(&user).cloned())
    }

    async fn set_nickname(
        &self,
        guild: DiscordId,
        user: DiscordId,
        nickname: Option<&str>,
    ) -> Result<(), DiscordError> {
        self.begin_write(guild)?;
        self.require_member(user)?;
        let mut state = self.state.lock();
        match nickname {
            Some(nick) => state.nicknames.insert(user, nick.to_string()),
            None => state.nicknames.remove(&user),
        };
        Ok(())
    }
}

// ===== Game side =====

/// Permission groups keyed by player, group, and optional context.
#[derive(Default)]
pub struct MemoryPermissions {
    groups: Mutex<HashSet<(GameId, String, Option<String>)>>,
    pub calls: CallCounter,
}

impl MemoryPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, player: GameId, group: &str) {
        self.groups.lock().insert((player, group.to_string(), None));
    }

    pub fn in_group(&self, player: GameId, group: &str) -> bool {
        self.groups.lock().contains(&(player, group.to_string(), None))
    }
}

#[async_trait]
impl PermissionBackend for MemoryPermissions {
    async fn has_group(
        &self,
        player: GameId,
        group: &str,
        context: Option<&str>,
    ) -> Result<bool, BackendError> {
        self.calls.read();
        let key = (player, group.to_string(), context.map(str::to_string));
        Ok(self.groups.lock().contains(&key))
    }

    async fn add_group(
        &self,
        player: GameId,
        group: &str,
        context: Option<&str>,
    ) -> Result<(), BackendError> {
        self.calls.write();
        self.groups.lock().insert((player, group.to_string(), context.map(str::to_string)));
        Ok(())
    }

    async fn remove_group(
        &self,
        player: GameId,
        group: &str,
        context: Option<&str>,
    ) -> Result<(), BackendError> {
        self.calls.write();
        let key = (player, group.to_string(), context.map(str::to_string));
        self.groups.lock().remove(&key);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPunishments {
    records: Mutex<HashMap<(PunishmentKind, GameId), Punishment>>,
    pub calls: CallCounter,
}

impl MemoryPunishments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn punish(&self, kind: PunishmentKind, player: GameId, punishment: Punishment) {
        self.records.lock().insert((kind, player), punishment);
    }

    pub fn record(&self, kind: PunishmentKind, player: GameId) -> Option<Punishment> {
        self.records.lock().get(&(kind, player)).cloned()
    }
}

#[async_trait]
impl PunishmentIntegration for MemoryPunishments {
    async fn get_punishment(
        &self,
        kind: PunishmentKind,
        player: GameId,
    ) -> Result<Option<Punishment>, BackendError> {
        self.calls.read();
        Ok(self.records.lock().get(&(kind, player)).cloned())
    }

    async fn add_punishment(
        &self,
        kind: PunishmentKind,
        player: GameId,
        punishment: &Punishment,
    ) -> Result<(), BackendError> {
        self.calls.write();
        self.records.lock().insert((kind, player), punishment.clone());
        Ok(())
    }

    async fn remove_punishment(
        &self,
        kind: PunishmentKind,
        player: GameId,
    ) -> Result<(), BackendError> {
        self.calls.write();
        self.records.lock().remove(&(kind, player));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPlayers {
    online: Mutex<HashSet<GameId>>,
    nicknames: Mutex<HashMap<GameId, String>>,
    pub calls: CallCounter,
}

impl MemoryPlayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_online(&self, player: GameId, online: bool) {
        let mut players = self.online.lock();
        if online {
            players.insert(player);
        } else {
            players.remove(&player);
        }
    }

    pub fn set_display_name(&self, player: GameId, nickname: &str) {
        self.nicknames.lock().insert(player, nickname.to_string());
    }

    pub fn display_name(&self, player: GameId) -> Option<String> {
        self.nicknames.lock().get(&player).cloned()
    }
}

#[async_trait]
impl PlayerDirectory for MemoryPlayers {
    async fn is_online(&self, player: GameId) -> Result<bool, BackendError> {
        self.calls.read();
        Ok(self.online.lock().contains(&player))
    }

    async fn online_players(&self) -> Result<Vec<GameId>, BackendError> {
        self.calls.read();
        let mut players: Vec<GameId> = self.online.lock().iter().copied().collect();
        players.sort();
        Ok(players)
    }

    async fn nickname(&self, player: GameId) -> Result<Option<String>, BackendError> {
        self.calls.read();
        Ok(self.nicknames.lock().get(&player).cloned())
    }

    async fn set_nickname(
        &self,
        player: GameId,
        nickname: Option<&str>,
    ) -> Result<(), BackendError> {
        self.calls.write();
        let mut nicknames = self.nicknames.lock();
        match nickname {
            Some(nick) => nicknames.insert(player, nick.to_string()),
            None => nicknames.remove(&player),
        };
        Ok(())
    }
}
