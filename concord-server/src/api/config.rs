//! Configuration handlers

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;

use concord_core::config as core_config;
use concord_types::SyncKind;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub reloaded: bool,
    pub enabled_kinds: Vec<SyncKind>,
}

/// Re-read the config file and swap the engine snapshot. Resyncs already
/// running finish on the old snapshot.
pub async fn reload_config(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, (StatusCode, String)> {
    let path = state.config_path().to_path_buf();
    let config = match tokio::task::spawn_blocking(move || core_config::load_config_from(&path)).await
    {
        Ok(Ok(config)) => config,
        Ok(Err(e)) => {
            tracing::warn!("[Config] reload rejected: {}", e);
            return Err((StatusCode::BAD_REQUEST, e.to_string()));
        },
        Err(e) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("spawn_blocking panicked: {e}"),
            ))
        },
    };

    state.engine().reload(config).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let enabled_kinds = state.engine().snapshot().enabled_kinds();

    Ok(Json(ReloadResponse { reloaded: true, enabled_kinds }))
}
