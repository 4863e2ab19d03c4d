#![allow(unused_crate_dependencies)]
#![allow(clippy::tests_outside_test_module, reason = "integration tests live in tests/ dir")]
#![allow(clippy::expect_used, reason = "integration test: panics are the assertion mechanism")]

use concord_core::adapters::GameBridge;
use concord_core::sync::{PermissionBackend, PlayerDirectory, PunishmentIntegration};
use concord_types::models::BridgeConfig;
use concord_types::{BackendError, GameId, Punishment, PunishmentKind};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PLAYER: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

fn player() -> GameId {
    PLAYER.parse().expect("valid uuid")
}

async fn setup(token: Option<&str>) -> (MockServer, GameBridge) {
    let server = MockServer::start().await;
    let config = BridgeConfig {
        url: server.uri(),
        token: token.map(str::to_string),
        request_timeout_secs: 5,
    };
    let bridge = GameBridge::new(&config).expect("bridge builds");
    (server, bridge)
}

#[tokio::test]
async fn test_group_membership_with_context() {
    let (server, bridge) = setup(Some("secret")).await;
    let group_path = format!("/players/{}/groups/Donor", PLAYER);

    Mock::given(method("GET"))
        .and(path(group_path.as_str()))
        .and(query_param("context", "survival"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "member": true })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(group_path.as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    assert!(bridge.has_group(player(), "Donor", Some("survival")).await.expect("lookup"));
    bridge.add_group(player(), "Donor", None).await.expect("add");
}

#[tokio::test]
async fn test_unknown_group_and_missing_integration() {
    let (server, bridge) = setup(None).await;

    Mock::given(method("DELETE"))
        .and(path(format!("/players/{}/groups/Ghost", PLAYER).as_str()))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/players/{}/punishments/mute", PLAYER).as_str()))
        .respond_with(
            ResponseTemplate::new(501).set_body_json(json!({ "error": "no mute plugin" })),
        )
        .mount(&server)
        .await;

    assert_eq!(
        bridge.remove_group(player(), "Ghost", None).await,
        Err(BackendError::UnknownGroup { group: "Ghost".to_string() })
    );
    assert_eq!(
        bridge.get_punishment(PunishmentKind::Mute, player()).await,
        Err(BackendError::NotAvailable { capability: "mute".to_string() })
    );
}

#[tokio::test]
async fn test_punishments_round_trip_through_plugin() {
    let (server, bridge) = setup(None).await;
    let ban_path = format!("/players/{}/punishments/ban", PLAYER);
    let ban = Punishment { until: None, reason: Some("xray".into()), punisher: Some("Mod".into()) };

    {
        let _guard = Mock::given(method("GET"))
            .and(path(ban_path.as_str()))
            .respond_with(ResponseTemplate::new(404))
            .mount_as_scoped(&server)
            .await;
        assert_eq!(bridge.get_punishment(PunishmentKind::Ban, player()).await, Ok(None));
    }

    Mock::given(method("PUT"))
        .and(path(ban_path.as_str()))
        .and(body_json(json!({ "until": null, "reason": "xray", "punisher": "Mod" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    bridge.add_punishment(PunishmentKind::Ban, player(), &ban).await.expect("ban added");

    Mock::given(method("GET"))
        .and(path(ban_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reason": "xray" })))
        .mount(&server)
        .await;
    let read = bridge.get_punishment(PunishmentKind::Ban, player()).await.expect("ban read");
    assert_eq!(read.and_then(|p| p.reason), Some("xray".to_string()));
}

#[tokio::test]
async fn test_presence_and_nickname() {
    let (server, bridge) = setup(None).await;

    Mock::given(method("GET"))
        .and(path("/players/online"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "players": [PLAYER] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/players/{}/online", PLAYER).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "online": true })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/players/{}/nickname", PLAYER).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "nickname": "" })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/players/{}/nickname", PLAYER).as_str()))
        .and(body_json(json!({ "nickname": "Alex" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(bridge.online_players().await.expect("online list"), vec![player()]);
    assert!(bridge.is_online(player()).await.expect("presence"));
    assert_eq!(bridge.nickname(player()).await.expect("nickname"), None);
    bridge.set_nickname(player(), Some("Alex")).await.expect("nickname set");
}

#[tokio::test]
async fn test_denied_and_server_errors() {
    let (server, bridge) = setup(None).await;

    Mock::given(method("PUT"))
        .and(path(format!("/players/{}/groups/Admin", PLAYER).as_str()))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "error": "protected" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/players/{}/online", PLAYER).as_str()))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    assert_eq!(
        bridge.add_group(player(), "Admin", None).await,
        Err(BackendError::Denied {
            operation: "group change".to_string(),
            message: "protected".to_string()
        })
    );
    assert!(matches!(bridge.is_online(player()).await, Err(BackendError::Failed { .. })));
}
