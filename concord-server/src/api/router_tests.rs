#![allow(clippy::unwrap_used, reason = "test assertions")]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use crate::build_router;
use crate::state::AppState;
use crate::test_helpers::test_app_state;

fn with_api_key(state: &AppState, key: &str) {
    let mut config = (*state.engine().config()).clone();
    config.server.api_key = Some(key.to_string());
    state.engine().reload(config).unwrap();
}

async fn status_of(app: Router, request: Request<Body>) -> StatusCode {
    app.oneshot(request).await.unwrap().status()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_open_api_without_key() {
    let (state, _world, _tmp) = test_app_state().await;
    let app = build_router(state);

    assert_eq!(status_of(app.clone(), get("/api/status")).await, StatusCode::OK);
    assert_eq!(status_of(app.clone(), get("/health")).await, StatusCode::OK);
    assert_eq!(status_of(app, get("/api/nope")).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_key_is_enforced() {
    let (state, _world, _tmp) = test_app_state().await;
    with_api_key(&state, "sk-concord-test");
    let app = build_router(state);

    assert_eq!(status_of(app.clone(), get("/api/status")).await, StatusCode::UNAUTHORIZED);
    assert_eq!(status_of(app.clone(), get("/health")).await, StatusCode::OK);

    let wrong = Request::builder()
        .uri("/api/status")
        .header(header::AUTHORIZATION, "Bearer sk-concord-nope")
        .body(Body::empty())
        .unwrap();
    assert_eq!(status_of(app.clone(), wrong).await, StatusCode::UNAUTHORIZED);

    let bearer = Request::builder()
        .uri("/api/status")
        .header(header::AUTHORIZATION, "Bearer sk-concord-test")
        .body(Body::empty())
        .unwrap();
    assert_eq!(status_of(app.clone(), bearer).await, StatusCode::OK);

    let header_key = Request::builder()
        .uri("/api/status")
        .header("x-api-key", "sk-concord-test")
        .body(Body::empty())
        .unwrap();
    assert_eq!(status_of(app, header_key).await, StatusCode::OK);
}

#[tokio::test]
async fn test_notify_over_http() {
    let (state, world, _tmp) = test_app_state().await;
    let app = build_router(state);

    let body = serde_json::json!({
        "identity": { "game_id": world.pair.game_id },
        "cause": { "scope": "generic", "cause": "game_join" }
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/notify")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["processed"], true);
    assert_eq!(json["reports"].as_array().map(Vec::len), Some(3));
}
