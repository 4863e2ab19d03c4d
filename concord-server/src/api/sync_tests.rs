#![allow(clippy::unwrap_used, clippy::indexing_slicing, reason = "test assertions")]

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

use concord_core::ResyncRequest;
use concord_types::{
    GroupSyncResult, OnlineRoleSyncResult, ResultCategory, ResyncStatus, Someone, SyncCause,
    SyncKind, SyncResult,
};

use super::config::reload_config;
use super::get_status;
use super::sync::{notify, resync, resync_online, NotifyRequest};
use crate::test_helpers::{test_app_state, test_config, TestWorld};

#[tokio::test]
async fn test_status_reports_enabled_kinds() {
    let (state, _world, _tmp) = test_app_state().await;
    let Json(status) = get_status(State(state)).await;

    assert_eq!(status.enabled_kinds, vec![SyncKind::Ban, SyncKind::Group, SyncKind::OnlineRole]);
    assert_eq!(status.guild_id, Some(TestWorld::GUILD));
    assert!(status.discord_connected);
    assert_eq!(status.in_flight, 0);
}

#[tokio::test]
async fn test_notify_runs_and_then_suppresses_echo() {
    let (state, world, _tmp) = test_app_state().await;
    world.permissions.grant(world.pair.game_id, "Donor");

    let request = NotifyRequest {
        identity: Someone::game(world.pair.game_id),
        cause: SyncCause::group_changed("Donor"),
        kind: None,
    };
    let Json(response) = notify(State(state.clone()), Json(request)).await;
    assert!(response.processed);
    assert_eq!(response.reports.len(), 1);
    assert_eq!(response.reports[0].primary(), Some(GroupSyncResult::AddDiscord.into()));
    assert!(world.discord.user_has_role(world.pair.discord_id, TestWorld::DONOR_ROLE));

    // The Discord listener reports the role the engine just added.
    let echo = NotifyRequest {
        identity: Someone::discord(world.pair.discord_id),
        cause: SyncCause::discord_role_changed(TestWorld::DONOR_ROLE),
        kind: None,
    };
    let Json(response) = notify(State(state), Json(echo)).await;
    assert!(!response.processed);
    assert!(response.reports.is_empty());
}

#[tokio::test]
async fn test_notify_with_kind_is_direct() {
    let (state, world, _tmp) = test_app_state().await;

    let request = NotifyRequest {
        identity: Someone::discord(world.pair.discord_id),
        cause: SyncCause::API,
        kind: Some(SyncKind::OnlineRole),
    };
    let Json(response) = notify(State(state), Json(request)).await;
    assert_eq!(response.reports.len(), 1);
    assert_eq!(
        response.reports[0].primary(),
        Some(OnlineRoleSyncResult::PlayerNotOnline.into())
    );
}

#[tokio::test]
async fn test_notify_request_deserializes_wire_form() {
    let (_state, world, _tmp) = test_app_state().await;
    let body = serde_json::json!({
        "identity": { "discord_id": world.pair.discord_id.to_string() },
        "cause": { "scope": "group", "cause": { "change": "discord_role_changed", "role_id": "2001" } }
    });

    let request: NotifyRequest = serde_json::from_value(body).unwrap();
    assert_eq!(request.identity, Someone::discord(world.pair.discord_id));
    assert_eq!(request.cause, SyncCause::discord_role_changed(TestWorld::DONOR_ROLE));
    assert!(request.kind.is_none());

    let minimal: NotifyRequest =
        serde_json::from_value(serde_json::json!({ "identity": { "discord_id": 42 } })).unwrap();
    assert_eq!(minimal.cause, SyncCause::API);
}

#[tokio::test]
async fn test_resync_summary_over_linked_accounts() {
    let (state, world, _tmp) = test_app_state().await;
    world.players.set_online(world.pair.game_id, true);

    let Json(summary) =
        resync(State(state.clone()), Json(ResyncRequest::all(SyncCause::COMMAND))).await.unwrap();
    assert_eq!(summary.identities, 1);
    assert_eq!(summary.status, ResyncStatus::Success);
    let added = SyncResult::from(OnlineRoleSyncResult::AddRole);
    assert_eq!(summary.by_result.get(added.label()), Some(&1));

    let Json(again) =
        resync(State(state), Json(ResyncRequest::all(SyncCause::COMMAND))).await.unwrap();
    assert_eq!(again.by_category.get(&ResultCategory::InSync), Some(&again.total));
}

#[tokio::test]
async fn test_resync_rejects_empty_identity_list() {
    let (state, _world, _tmp) = test_app_state().await;
    let request =
        ResyncRequest { identities: Some(Vec::new()), kinds: None, cause: SyncCause::COMMAND };

    let err = resync(State(state), Json(request)).await.unwrap_err();
    assert_eq!(err.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_resync_online_skips_offline() {
    let (state, _world, _tmp) = test_app_state().await;
    let Json(summary) = resync_online(State(state)).await;

    assert_eq!(summary.identities, 0);
    assert_eq!(summary.status, ResyncStatus::Success);
}

#[tokio::test]
async fn test_reload_picks_up_file_changes() {
    let (state, _world, _tmp) = test_app_state().await;

    let mut config = test_config();
    config.ban.enabled = false;
    config.nickname.enabled = true;
    concord_core::config::save_config_to(state.config_path(), &config).unwrap();

    let Json(response) = reload_config(State(state.clone())).await.unwrap();
    assert!(response.reloaded);
    assert_eq!(
        response.enabled_kinds,
        vec![SyncKind::Group, SyncKind::Nickname, SyncKind::OnlineRole]
    );
}

#[tokio::test]
async fn test_reload_rejects_invalid_file() {
    let (state, _world, _tmp) = test_app_state().await;
    std::fs::write(state.config_path(), r#"{"online_role": {"enabled": true}}"#).unwrap();

    let err = reload_config(State(state.clone())).await.unwrap_err();
    assert_eq!(err.0, StatusCode::BAD_REQUEST);

    let Json(status) = get_status(State(state)).await;
    assert!(status.enabled_kinds.contains(&SyncKind::Ban), "old snapshot stays active");
}
