#![allow(clippy::unwrap_used)]

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;

use concord_types::models::{GroupPairConfig, OnlineRoleConfig};
use concord_types::{
    AppConfig, BanCause, BanSyncResult, Direction, DiscordError, DiscordId, GameId,
    GenericSyncResult, GroupSyncResult, MuteSyncResult, NicknameSyncResult, OnlineRoleCause,
    OnlineRoleSyncResult, Punishment, PunishmentKind, ResolvedSomeone, ResultCategory,
    ResyncStatus, Someone, SyncCause, SyncKind, SyncResult,
};

use super::{Collaborators, DiscordClient, DispatchTrigger, ResyncRequest, SyncEngine};
use crate::adapters::memory::{
    MemoryDiscord, MemoryLinkStore, MemoryPermissions, MemoryPlayers, MemoryPunishments,
};

const GUILD: DiscordId = DiscordId(1000);
const DONOR_ROLE: DiscordId = DiscordId(2001);
const VIP_ROLE: DiscordId = DiscordId(2002);
const ONLINE_ROLE: DiscordId = DiscordId(2003);

struct World {
    engine: SyncEngine,
    links: Arc<MemoryLinkStore>,
    discord: Arc<MemoryDiscord>,
    permissions: Arc<MemoryPermissions>,
    punishments: Arc<MemoryPunishments>,
    players: Arc<MemoryPlayers>,
    pair: ResolvedSomeone,
}

impl World {
    fn who(&self) -> Someone {
        Someone::from(self.pair)
    }

    fn discord_calls(&self) -> usize {
        self.discord.calls.total()
    }

    fn game_calls(&self) -> usize {
        self.permissions.calls.total()
            + self.punishments.calls.total()
            + self.players.calls.total()
    }
}

fn config() -> AppConfig {
    let mut config = AppConfig::new();
    config.discord.guild_id = Some(GUILD);
    config.ban.enabled = true;
    config.mute.enabled = true;
    config.nickname.enabled = true;
    config.groups.enabled = true;
    config.groups.pairs = vec![GroupPairConfig::new("Donor", DONOR_ROLE)];
    let mut vip = GroupPairConfig::new("vip", VIP_ROLE);
    vip.direction = Direction::DiscordAuthoritative;
    config.groups.pairs.push(vip);
    config.online_role = OnlineRoleConfig { enabled: true, role_id: Some(ONLINE_ROLE) };
    config
}

fn world_with(config: AppConfig) -> World {
    let pair = ResolvedSomeone::new(GameId::random(), DiscordId(42));
    let links = Arc::new(MemoryLinkStore::with_links([pair]));
    let discord = Arc::new(MemoryDiscord::new(GUILD));
    discord.add_member(pair.discord_id);
    let permissions = Arc::new(MemoryPermissions::new());
    let punishments = Arc::new(MemoryPunishments::new());
    let players = Arc::new(MemoryPlayers::new());

    let collaborators = Collaborators::new(links.clone())
        .with_discord(discord.clone())
        .with_permissions(permissions.clone())
        .with_punishments(punishments.clone())
        .with_players(players.clone());

    World {
        engine: SyncEngine::new(config, collaborators),
        links,
        discord,
        permissions,
        punishments,
        players,
        pair,
    }
}

fn world() -> World {
    world_with(config())
}

// ===== Scenarios =====

#[tokio::test]
async fn test_game_ban_is_copied_with_reason_then_in_sync() {
    let w = world();
    w.punishments.punish(
        PunishmentKind::Ban,
        w.pair.game_id,
        Punishment::permanent(Some("griefing spawn".into()), Some("Console".into())),
    );

    let report = w.engine.resync(w.who(), SyncKind::Ban, SyncCause::COMMAND).await;
    assert_eq!(report.primary(), Some(BanSyncResult::BanUser.into()));
    assert_eq!(report.resolved, Some(w.pair));
    assert_eq!(w.discord.ban_reason(w.pair.discord_id), Some(Some("griefing spawn".into())));

    let again = w.engine.resync(w.who(), SyncKind::Ban, SyncCause::COMMAND).await;
    assert_eq!(again.primary(), Some(SyncResult::ALREADY_IN_SYNC));
    assert_eq!(w.discord.calls.writes(), 1);
}

#[tokio::test]
async fn test_expired_game_ban_lifts_discord_ban() {
    let w = world();
    w.discord.ban_user(w.pair.discord_id, Some("old"));
    w.punishments.punish(
        PunishmentKind::Ban,
        w.pair.game_id,
        Punishment::until(Utc::now() - ChronoDuration::minutes(5), None, None),
    );

    let report = w.engine.resync(w.who(), SyncKind::Ban, SyncCause::TIMER).await;
    assert_eq!(report.primary(), Some(BanSyncResult::UnbanUser.into()));
    assert!(w.discord.ban_reason(w.pair.discord_id).is_none());
}

#[tokio::test]
async fn test_group_names_are_case_sensitive() {
    let w = world();
    w.permissions.grant(w.pair.game_id, "donor");
    w.discord.give_role(w.pair.discord_id, DONOR_ROLE);
    w.discord.create_role(VIP_ROLE);

    let report =
        w.engine.resync(w.who(), SyncKind::Group, SyncCause::discord_role_changed(DONOR_ROLE)).await;

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.primary(), Some(GroupSyncResult::AddGame.into()));
    assert_eq!(report.outcomes[0].entry.as_deref(), Some("Donor:2001"));
    assert!(w.permissions.in_group(w.pair.game_id, "Donor"));
    assert!(w.permissions.in_group(w.pair.game_id, "donor"));
    assert_eq!(w.discord.calls.writes(), 0);
}

#[tokio::test]
async fn test_group_timer_reconciles_every_pair() {
    let w = world();
    w.discord.create_role(DONOR_ROLE);
    w.discord.give_role(w.pair.discord_id, VIP_ROLE);

    let report = w.engine.resync(w.who(), SyncKind::Group, SyncCause::TIMER).await;

    let results: Vec<SyncResult> = report.results().collect();
    assert_eq!(results.len(), 2);
    assert!(results.contains(&GroupSyncResult::BothFalse.into()));
    assert!(results.contains(&GroupSyncResult::AddGame.into()));
    assert!(w.permissions.in_group(w.pair.game_id, "vip"));
}

#[tokio::test]
async fn test_discord_authoritative_pair_ignores_game_change() {
    let w = world();
    w.permissions.grant(w.pair.game_id, "vip");
    w.discord.create_role(VIP_ROLE);

    let report = w.engine.resync(w.who(), SyncKind::Group, SyncCause::group_changed("vip")).await;
    assert_eq!(report.primary(), Some(SyncResult::WRONG_DIRECTION));
    assert_eq!(report.primary().map(|r| r.category()), Some(ResultCategory::Skipped));
    assert!(!w.discord.user_has_role(w.pair.discord_id, VIP_ROLE));
    assert_eq!(w.discord.calls.writes() + w.permissions.calls.writes(), 0);

    let report = w
        .engine
        .resync(w.who(), SyncKind::Group, SyncCause::discord_role_changed(VIP_ROLE))
        .await;
    assert_eq!(report.primary(), Some(GroupSyncResult::RemoveGame.into()));
    assert!(!w.permissions.in_group(w.pair.game_id, "vip"));
}

#[tokio::test]
async fn test_missing_role_is_reported_per_pair() {
    let w = world();
    w.discord.create_role(VIP_ROLE);

    let report = w.engine.resync(w.who(), SyncKind::Group, SyncCause::TIMER).await;
    let donor = report.outcomes.iter().find(|o| o.entry.as_deref() == Some("Donor:2001")).unwrap();
    let vip = report.outcomes.iter().find(|o| o.entry.as_deref() == Some("vip:2002")).unwrap();
    assert_eq!(donor.result, GenericSyncResult::RoleDoesntExist.into());
    assert!(donor.message.contains("2001"));
    assert_eq!(vip.result, GroupSyncResult::BothFalse.into());
}

#[tokio::test]
async fn test_mute_beyond_timeout_ceiling_is_too_long() {
    let w = world();
    w.punishments.punish(
        PunishmentKind::Mute,
        w.pair.game_id,
        Punishment::until(Utc::now() + ChronoDuration::days(40), Some("spam".into()), None),
    );

    let report = w.engine.resync(w.who(), SyncKind::Mute, SyncCause::COMMAND).await;
    assert_eq!(report.primary(), Some(MuteSyncResult::PunishmentTooLong.into()));
    assert!(report.has_errors());
    assert!(w.discord.timeout_of(w.pair.discord_id).is_none());
    assert_eq!(w.discord.calls.writes(), 0);
}

#[tokio::test]
async fn test_short_mute_becomes_timeout() {
    let w = world();
    let until = Utc::now() + ChronoDuration::hours(2);
    w.punishments.punish(PunishmentKind::Mute, w.pair.game_id, Punishment::until(until, None, None));

    let report = w.engine.resync(w.who(), SyncKind::Mute, SyncCause::COMMAND).await;
    assert_eq!(report.primary(), Some(MuteSyncResult::TimeoutUser.into()));
    assert_eq!(w.discord.timeout_of(w.pair.discord_id), Some(until));
}

#[tokio::test]
async fn test_offline_player_skips_discord_read() {
    let w = world();
    w.discord.give_role(w.pair.discord_id, ONLINE_ROLE);

    let report = w.engine.resync(w.who(), SyncKind::OnlineRole, SyncCause::TIMER).await;
    assert_eq!(report.primary(), Some(OnlineRoleSyncResult::PlayerNotOnline.into()));
    assert_eq!(w.discord_calls(), 0);
}

#[tokio::test]
async fn test_online_role_follows_presence() {
    let w = world();
    w.discord.create_role(ONLINE_ROLE);
    w.players.set_online(w.pair.game_id, true);

    let joined = w.engine.resync(w.who(), SyncKind::OnlineRole, SyncCause::GAME_JOIN).await;
    assert_eq!(joined.primary(), Some(OnlineRoleSyncResult::AddRole.into()));
    assert!(w.discord.user_has_role(w.pair.discord_id, ONLINE_ROLE));

    let quit = SyncCause::OnlineRole(OnlineRoleCause::PlayerQuit);
    let left = w.engine.resync(w.who(), SyncKind::OnlineRole, quit).await;
    assert_eq!(left.primary(), Some(OnlineRoleSyncResult::RemoveRole.into()));
    assert!(!w.discord.user_has_role(w.pair.discord_id, ONLINE_ROLE));
}

#[tokio::test]
async fn test_nickname_limits() {
    let w = world();
    w.players.set_display_name(w.pair.game_id, "Steve");

    let report = w.engine.resync(w.who(), SyncKind::Nickname, SyncCause::COMMAND).await;
    assert_eq!(report.primary(), Some(NicknameSyncResult::SetDiscord.into()));
    assert_eq!(w.discord.nickname_of(w.pair.discord_id).as_deref(), Some("Steve"));

    w.players.set_display_name(w.pair.game_id, "Sir Reginald the Unreasonably Verbose");
    let report = w.engine.resync(w.who(), SyncKind::Nickname, SyncCause::COMMAND).await;
    assert_eq!(report.primary(), Some(NicknameSyncResult::NicknameTooLong.into()));
    assert_eq!(w.discord.nickname_of(w.pair.discord_id).as_deref(), Some("Steve"));
}

#[tokio::test]
async fn test_non_member_is_reported() {
    let w = world();
    let stranger = ResolvedSomeone::new(GameId::random(), DiscordId(77));
    w.links.insert(stranger);

    let report =
        w.engine.resync(Someone::game(stranger.game_id), SyncKind::Nickname, SyncCause::API).await;
    assert_eq!(report.primary(), Some(GenericSyncResult::NotAGuildMember.into()));
    assert!(report.outcomes[0].message.contains("nickname failed"));
}

#[tokio::test]
async fn test_discord_outage_maps_to_no_connection() {
    let w = world();
    w.discord.fail_with(Some(DiscordError::NoConnection { message: "gateway closed".into() }));

    let report = w.engine.resync(w.who(), SyncKind::Ban, SyncCause::COMMAND).await;
    assert_eq!(report.primary(), Some(GenericSyncResult::NoDiscordConnection.into()));
    assert_eq!(w.punishments.calls.writes(), 0);
}

// ===== Engine properties =====

#[tokio::test]
async fn test_unlinked_identity_invokes_no_accessor() {
    let w = world();

    let reports =
        w.engine.notify_changed(Someone::game(GameId::random()), SyncCause::GAME_JOIN).await;

    assert_eq!(reports.len(), SyncKind::ALL.len());
    assert!(reports.iter().all(|r| r.primary() == Some(SyncResult::NOT_LINKED)));
    assert_eq!(w.links.lookups(), 1);
    assert_eq!(w.discord_calls() + w.game_calls(), 0);
}

#[tokio::test]
async fn test_link_store_outage_is_not_unlinked() {
    let w = world();
    w.links.set_unavailable(true);

    let report = w.engine.resync(Someone::discord(DiscordId(42)), SyncKind::Ban, SyncCause::API).await;
    assert_eq!(report.primary(), Some(GenericSyncResult::LinkStoreUnavailable.into()));
    assert_eq!(w.discord_calls(), 0);
}

#[tokio::test]
async fn test_engine_write_is_not_reprocessed() {
    let w = world();
    w.punishments.punish(
        PunishmentKind::Ban,
        w.pair.game_id,
        Punishment::permanent(Some("x-ray".into()), None),
    );

    let first = w.engine.notify_changed(w.who(), SyncCause::Ban(BanCause::GameBanChanged)).await;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].primary(), Some(BanSyncResult::BanUser.into()));
    let writes = w.discord.calls.writes() + w.punishments.calls.writes();

    let echo = w
        .engine
        .notify_changed(Someone::discord(w.pair.discord_id), SyncCause::Ban(BanCause::DiscordBanChanged))
        .await;
    assert!(echo.is_empty());
    assert_eq!(w.discord.calls.writes() + w.punishments.calls.writes(), writes);

    let unrelated = w
        .engine
        .notify_changed(w.who(), SyncCause::discord_role_changed(DONOR_ROLE))
        .await;
    assert_eq!(unrelated.len(), 1);
    assert_eq!(unrelated[0].kind, SyncKind::Group);
}

#[tokio::test]
async fn test_group_marker_is_scoped_to_its_role() {
    let w = world();
    w.discord.create_role(DONOR_ROLE);
    w.discord.create_role(VIP_ROLE);
    w.permissions.grant(w.pair.game_id, "Donor");

    let written = w.engine.resync(w.who(), SyncKind::Group, SyncCause::group_changed("Donor")).await;
    assert_eq!(written.primary(), Some(GroupSyncResult::AddDiscord.into()));

    let echo = w.engine.notify_changed(w.who(), SyncCause::discord_role_changed(DONOR_ROLE)).await;
    assert!(echo.is_empty());
    let other = w.engine.notify_changed(w.who(), SyncCause::discord_role_changed(VIP_ROLE)).await;
    assert_eq!(other.len(), 1);
}

#[tokio::test]
async fn test_reversal_after_engine_write_is_processed() {
    let w = world();
    w.discord.create_role(DONOR_ROLE);
    w.discord.create_role(VIP_ROLE);
    w.permissions.grant(w.pair.game_id, "Donor");

    let written = w.engine.resync(w.who(), SyncKind::Group, SyncCause::group_changed("Donor")).await;
    assert_eq!(written.primary(), Some(GroupSyncResult::AddDiscord.into()));
    assert!(w.discord.user_has_role(w.pair.discord_id, DONOR_ROLE));

    // A moderator takes the role away before the marker expires.
    w.discord.remove_role(GUILD, w.pair.discord_id, DONOR_ROLE).await.unwrap();

    let reports =
        w.engine.notify_changed(w.who(), SyncCause::discord_role_changed(DONOR_ROLE)).await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].primary(), Some(GroupSyncResult::RemoveGame.into()));
    assert!(!w.permissions.in_group(w.pair.game_id, "Donor"));
    assert!(!w.discord.user_has_role(w.pair.discord_id, DONOR_ROLE));

    let settled = w.engine.resync(w.who(), SyncKind::Group, SyncCause::COMMAND).await;
    assert!(settled.results().all(|r| r.category() == ResultCategory::InSync));
}

#[tokio::test]
async fn test_notify_runs_again_once_marker_expires() {
    let mut short_ttl = config();
    short_ttl.engine.loop_guard_ttl_ms = 100;
    let w = world_with(short_ttl);
    w.punishments.punish(PunishmentKind::Ban, w.pair.game_id, Punishment::default());

    let first = w.engine.notify_changed(w.who(), SyncCause::Ban(BanCause::GameBanChanged)).await;
    assert_eq!(first[0].primary(), Some(BanSyncResult::BanUser.into()));

    let discord_side = Someone::discord(w.pair.discord_id);
    let echo = w.engine.notify_changed(discord_side, SyncCause::Ban(BanCause::DiscordBanChanged)).await;
    assert!(echo.is_empty());

    tokio::time::sleep(Duration::from_millis(150)).await;

    let later = w.engine.notify_changed(discord_side, SyncCause::Ban(BanCause::DiscordBanChanged)).await;
    assert_eq!(later.len(), 1);
    assert_eq!(later[0].primary(), Some(SyncResult::ALREADY_IN_SYNC));
    assert_eq!(w.discord.calls.writes(), 1);
}

#[tokio::test]
async fn test_neutral_cause_breaks_ties_toward_discord() {
    for cause in [SyncCause::COMMAND, SyncCause::TIMER] {
        let w = world();
        w.permissions.grant(w.pair.game_id, "donor");
        w.discord.give_role(w.pair.discord_id, DONOR_ROLE);
        w.discord.create_role(VIP_ROLE);

        let report = w.engine.resync(w.who(), SyncKind::Group, cause.clone()).await;
        let donor =
            report.outcomes.iter().find(|o| o.entry.as_deref() == Some("Donor:2001")).unwrap();
        assert_eq!(donor.result, GroupSyncResult::AddGame.into(), "{}", cause);
        assert!(w.permissions.in_group(w.pair.game_id, "Donor"));
        assert!(w.permissions.in_group(w.pair.game_id, "donor"));
        assert!(w.discord.user_has_role(w.pair.discord_id, DONOR_ROLE));
        assert_eq!(w.discord.calls.writes(), 0);
    }
}

#[tokio::test]
async fn test_concurrent_triggers_for_different_groups_both_run() {
    let w = world();
    w.discord.create_role(DONOR_ROLE);
    w.discord.give_role(w.pair.discord_id, VIP_ROLE);
    w.discord.set_read_delay(Some(Duration::from_millis(50)));

    let (donor, vip) = tokio::join!(
        w.engine.notify_changed(w.who(), SyncCause::group_changed("Donor")),
        w.engine.notify_changed(w.who(), SyncCause::discord_role_changed(VIP_ROLE)),
    );

    assert_eq!(donor.len(), 1);
    assert_eq!(donor[0].primary(), Some(GroupSyncResult::BothFalse.into()));
    assert_eq!(donor[0].outcomes[0].entry.as_deref(), Some("Donor:2001"));
    assert_eq!(vip.len(), 1);
    assert_eq!(vip[0].primary(), Some(GroupSyncResult::AddGame.into()));
    assert_eq!(vip[0].outcomes[0].entry.as_deref(), Some("vip:2002"));
    assert!(w.permissions.in_group(w.pair.game_id, "vip"));
    assert_eq!(w.engine.in_flight(), 0);
}

#[tokio::test]
async fn test_direct_resync_bypasses_loop_guard() {
    let w = world();
    w.punishments.punish(PunishmentKind::Ban, w.pair.game_id, Punishment::default());
    w.engine.resync(w.who(), SyncKind::Ban, SyncCause::COMMAND).await;

    let report = w.engine.resync(w.who(), SyncKind::Ban, SyncCause::Ban(BanCause::DiscordBanChanged)).await;
    assert_eq!(report.primary(), Some(SyncResult::ALREADY_IN_SYNC));
}

#[tokio::test]
async fn test_concurrent_resyncs_write_once() {
    let w = world();
    w.discord.set_read_delay(Some(Duration::from_millis(50)));
    w.punishments.punish(PunishmentKind::Ban, w.pair.game_id, Punishment::default());

    let (a, b) = tokio::join!(
        w.engine.resync(w.who(), SyncKind::Ban, SyncCause::COMMAND),
        w.engine.resync(w.who(), SyncKind::Ban, SyncCause::TIMER),
    );

    assert_eq!(w.discord.calls.writes(), 1);
    assert_eq!(a, b);
    assert_eq!(a.primary(), Some(BanSyncResult::BanUser.into()));
    assert_eq!(w.engine.in_flight(), 0);
}

#[tokio::test]
async fn test_disabled_module_and_reload() {
    let w = world();
    let mut next = config();
    next.ban.enabled = false;
    w.engine.reload(next).unwrap();

    let report = w.engine.resync(w.who(), SyncKind::Ban, SyncCause::COMMAND).await;
    assert_eq!(report.primary(), Some(GenericSyncResult::ModuleDisabled.into()));
    assert_eq!(w.game_calls(), 0);

    let mut invalid = config();
    invalid.discord.guild_id = None;
    assert!(w.engine.reload(invalid).is_err());
    assert!(!w.engine.config().ban.enabled);
}

#[tokio::test]
async fn test_missing_integrations() {
    let pair = ResolvedSomeone::new(GameId::random(), DiscordId(5));
    let links = Arc::new(MemoryLinkStore::with_links([pair]));
    let engine = SyncEngine::new(config(), Collaborators::new(links));
    let who = Someone::from(pair);

    let ban = engine.resync(who, SyncKind::Ban, SyncCause::COMMAND).await;
    assert_eq!(ban.primary(), Some(GenericSyncResult::NoDiscordConnection.into()));

    let discord = Arc::new(MemoryDiscord::new(GUILD));
    let collaborators = Collaborators::new(Arc::new(MemoryLinkStore::with_links([pair])))
        .with_discord(discord);
    let engine = SyncEngine::new(config(), collaborators);

    let ban = engine.resync(who, SyncKind::Ban, SyncCause::COMMAND).await;
    assert_eq!(ban.primary(), Some(BanSyncResult::NoPunishmentIntegration.into()));
    let group = engine.resync(who, SyncKind::Group, SyncCause::COMMAND).await;
    assert!(group.results().all(|r| r == GroupSyncResult::NoPermissionIntegration.into()));
}

// ===== Orchestration =====

#[tokio::test]
async fn test_resync_many_aggregates_and_is_idempotent() {
    let mut only_bans = config();
    only_bans.mute.enabled = false;
    only_bans.groups.enabled = false;
    only_bans.nickname.enabled = false;
    only_bans.online_role.enabled = false;
    let w = world_with(only_bans);

    let other = ResolvedSomeone::new(GameId::random(), DiscordId(43));
    w.links.insert(other);
    w.punishments.punish(PunishmentKind::Ban, w.pair.game_id, Punishment::default());

    let summary = w.engine.resync_many(ResyncRequest::all(SyncCause::COMMAND)).await;
    assert_eq!(summary.identities, 2);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.count(ResultCategory::Updated), 1);
    assert_eq!(summary.count(ResultCategory::InSync), 1);
    assert_eq!(summary.status, ResyncStatus::Success);

    let again = w.engine.resync_many(ResyncRequest::all(SyncCause::COMMAND)).await;
    assert_eq!(again.count(ResultCategory::InSync), 2);
    assert_eq!(again.count(ResultCategory::Updated), 0);
}

#[tokio::test]
async fn test_resync_many_filters_and_failures() {
    let w = world();
    let request = ResyncRequest {
        identities: Some(vec![w.who(), Someone::game(GameId::random())]),
        kinds: Some(vec![SyncKind::Ban]),
        cause: SyncCause::API,
    };

    let summary = w.engine.resync_many(request).await;
    assert_eq!(summary.total, 2);
    assert_eq!(summary.count_result(SyncResult::NOT_LINKED), 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.status, ResyncStatus::PartialFailure);

    w.links.set_unavailable(true);
    let failed = w.engine.resync_many(ResyncRequest::all(SyncCause::COMMAND)).await;
    assert_eq!(failed.status, ResyncStatus::Failure);
}

#[tokio::test]
async fn test_resync_online_skips_unlinked_players() {
    let w = world();
    w.discord.create_role(ONLINE_ROLE);
    w.players.set_online(w.pair.game_id, true);
    w.players.set_online(GameId::random(), true);

    let summary = w.engine.resync_online(SyncCause::TIMER).await;
    assert_eq!(summary.identities, 1);
    assert_eq!(summary.count_result(OnlineRoleSyncResult::AddRole.into()), 1);
    assert_eq!(summary.count_result(SyncResult::NOT_LINKED), 0);
}

#[tokio::test]
async fn test_resync_online_reports_link_failure_per_player() {
    let w = world();
    w.discord.create_role(DONOR_ROLE);
    w.discord.create_role(VIP_ROLE);
    w.discord.create_role(ONLINE_ROLE);
    let flaky = ResolvedSomeone::new(GameId::random(), DiscordId(43));
    w.links.insert(flaky);
    w.links.fail_lookups_for(flaky.game_id);
    w.players.set_online(w.pair.game_id, true);
    w.players.set_online(flaky.game_id, true);

    let summary = w.engine.resync_online(SyncCause::TIMER).await;
    let kinds = w.engine.snapshot().enabled_kinds().len();
    assert_eq!(summary.identities, 2);
    assert_eq!(summary.status, ResyncStatus::PartialFailure);
    assert_eq!(summary.count_result(GenericSyncResult::LinkStoreUnavailable.into()), kinds);
    let flaky_failures =
        summary.failures.iter().filter(|f| f.identity == Someone::game(flaky.game_id)).count();
    assert_eq!(flaky_failures, kinds);
    assert_eq!(summary.count_result(OnlineRoleSyncResult::AddRole.into()), 1);
    assert!(w.discord.user_has_role(w.pair.discord_id, ONLINE_ROLE));
}

#[tokio::test]
async fn test_resync_many_resolves_each_identity_once() {
    let w = world();
    w.discord.create_role(DONOR_ROLE);
    w.discord.create_role(VIP_ROLE);
    w.discord.create_role(ONLINE_ROLE);
    let request = ResyncRequest {
        identities: Some(vec![Someone::game(w.pair.game_id)]),
        kinds: None,
        cause: SyncCause::COMMAND,
    };

    let summary = w.engine.resync_many(request).await;
    assert!(summary.total >= 5);
    assert_eq!(summary.count_result(SyncResult::NOT_LINKED), 0);
    assert_eq!(w.links.lookups(), 1);
}
