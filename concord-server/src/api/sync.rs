//! Sync handlers

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};

use concord_core::{DispatchTrigger, ResyncRequest};
use concord_types::{ResyncSummary, Someone, SyncCause, SyncKind, SyncReport};

use crate::state::AppState;

/// A change observed by a platform listener, or a direct resync request.
#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    pub identity: Someone,
    #[serde(default = "default_cause")]
    pub cause: SyncCause,
    /// Run only this kind; the loop guard is not consulted
    #[serde(default)]
    pub kind: Option<SyncKind>,
}

fn default_cause() -> SyncCause {
    SyncCause::API
}

#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    /// False when a reactive notification ran nothing: it matched an engine
    /// write, or no enabled kind handles it
    pub processed: bool,
    pub reports: Vec<SyncReport>,
}

pub async fn notify(
    State(state): State<AppState>,
    Json(payload): Json<NotifyRequest>,
) -> Json<NotifyResponse> {
    let engine = state.engine();
    let reports = match payload.kind {
        Some(kind) => vec![engine.resync(payload.identity, kind, payload.cause).await],
        None => {
            let reactive = payload.cause.is_reactive();
            let reports = engine.notify_changed(payload.identity, payload.cause).await;
            if reactive && reports.is_empty() {
                return Json(NotifyResponse { processed: false, reports });
            }
            reports
        },
    };
    Json(NotifyResponse { processed: true, reports })
}

pub async fn resync(
    State(state): State<AppState>,
    Json(payload): Json<ResyncRequest>,
) -> Result<Json<ResyncSummary>, (StatusCode, String)> {
    if payload.identities.as_ref().is_some_and(Vec::is_empty) {
        return Err((StatusCode::BAD_REQUEST, "identities must not be empty".to_string()));
    }
    Ok(Json(state.engine().resync_many(payload).await))
}

pub async fn resync_online(State(state): State<AppState>) -> Json<ResyncSummary> {
    Json(state.engine().resync_online(SyncCause::COMMAND).await)
}
