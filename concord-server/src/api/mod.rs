//! API Routes
//!
//! REST endpoints for game plugins, bots, and operators. Every route under
//! `/api` requires `Authorization: Bearer <server.api_key>` when a key is
//! configured.

mod config;
mod sync;

#[cfg(test)]
mod router_tests;
#[cfg(test)]
mod sync_tests;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use subtle::ConstantTimeEq;

use concord_types::{DiscordId, SyncKind};

use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        // Status
        .route("/status", get(get_status))
        // Sync
        .route("/notify", post(sync::notify))
        .route("/resync", post(sync::resync))
        .route("/resync/online", post(sync::resync_online))
        // Config
        .route("/config/reload", post(config::reload_config))
        // Prometheus metrics
        .route("/metrics", get(get_metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        // API fallback: return 404 for unknown API endpoints
        .fallback(api_not_found)
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

async fn api_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "Not found"})))
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn provided_key(request: &Request) -> Option<&str> {
    let headers = request.headers();
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .or_else(|| headers.get("x-api-key").and_then(|v| v.to_str().ok()))
}

async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let config = state.engine().config();
    let Some(expected) = config.server.api_key.as_deref().filter(|k| !k.is_empty()) else {
        return Ok(next.run(request).await);
    };

    let authorized = provided_key(&request).is_some_and(|key| constant_time_compare(key, expected));
    if !authorized {
        tracing::warn!("[API] rejected {} {}: missing or wrong API key", request.method(), request.uri().path());
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(request).await)
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub build_time: String,
    pub uptime_secs: u64,
    pub guild_id: Option<DiscordId>,
    pub discord_connected: bool,
    pub enabled_kinds: Vec<SyncKind>,
    pub in_flight: usize,
    pub loop_guard_markers: usize,
    pub timer_enabled: bool,
    pub timer_interval_minutes: u32,
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let engine = state.engine();
    let snapshot = engine.snapshot();

    Json(StatusResponse {
        version: env!("GIT_VERSION").to_string(),
        build_time: env!("BUILD_TIME").to_string(),
        uptime_secs: state.uptime_secs(),
        guild_id: snapshot.config.discord.guild_id,
        discord_connected: engine.collaborators().discord.is_some(),
        enabled_kinds: snapshot.enabled_kinds(),
        in_flight: engine.in_flight(),
        loop_guard_markers: engine.guard().len(),
        timer_enabled: snapshot.config.timer.enabled,
        timer_interval_minutes: snapshot.config.timer.interval_minutes,
    })
}

async fn get_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        concord_core::metrics::render_metrics(),
    )
}
