//! HTTP bridge to the game-server plugin.
//!
//! The plugin exposes permissions, punishments, and presence as a small JSON
//! API under `/players`:
//!
//! ```text
//! GET|PUT|DELETE /players/{id}/groups/{group}[?context=..]   {"member": bool}
//! GET|PUT|DELETE /players/{id}/punishments/{ban|mute}        Punishment
//! GET            /players/{id}/online                        {"online": bool}
//! GET|PUT        /players/{id}/nickname                      {"nickname": str|null}
//! GET            /players/online                             {"players": [id]}
//! ```
//!
//! A `501` means the plugin has no integration for that capability.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use concord_types::models::BridgeConfig;
use concord_types::{BackendError, GameId, Punishment, PunishmentKind};

use super::{build_http_client, redact_url};
use crate::error::{AppError, AppResult};
use crate::sync::collaborators::{PermissionBackend, PlayerDirectory, PunishmentIntegration};

#[derive(Debug, Deserialize)]
struct MemberResponse {
    member: bool,
}

#[derive(Debug, Deserialize)]
struct OnlineResponse {
    online: bool,
}

#[derive(Debug, Deserialize)]
struct OnlinePlayersResponse {
    #[serde(default)]
    players: Vec<GameId>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NicknameBody {
    #[serde(default)]
    nickname: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BridgeErrorBody {
    #[serde(default)]
    error: String,
}

pub struct GameBridge {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl GameBridge {
    pub fn new(config: &BridgeConfig) -> AppResult<Self> {
        let base = Url::parse(&config.url)
            .map_err(|e| AppError::Unknown(format!("invalid bridge url: {}", e)))?;
        if base.cannot_be_a_base() {
            return Err(AppError::Unknown(format!("bridge url {} cannot be a base", config.url)));
        }
        let client = build_http_client(config.request_timeout_secs)?;
        tracing::info!("[Bridge] game bridge at {}", redact_url(&config.url));
        Ok(Self { client, base, token: config.token.clone().filter(|t| !t.is_empty()) })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self.client.request(method, url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Send and map transport and status failures. `Ok(None)` is a 404.
    async fn send(
        &self,
        req: RequestBuilder,
        capability: &str,
        operation: &str,
    ) -> Result<Option<Response>, BackendError> {
        let response = req.send().await.map_err(|e| BackendError::Failed {
            message: format!("{} request failed: {}", operation, e),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(Some(response));
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<BridgeErrorBody>(&body)
            .map(|b| b.error)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or(body);
        tracing::debug!("[Bridge] {} failed ({}): {}", operation, status, message);

        Err(match status {
            StatusCode::NOT_IMPLEMENTED => {
                BackendError::NotAvailable { capability: capability.to_string() }
            },
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                BackendError::Denied { operation: operation.to_string(), message }
            },
            _ => BackendError::Failed { message: format!("{} returned {}: {}", operation, status, message) },
        })
    }

    async fn json<T: serde::de::DeserializeOwned>(
        response: Response,
        operation: &str,
    ) -> Result<T, BackendError> {
        response.json::<T>().await.map_err(|e| BackendError::Failed {
            message: format!("{} returned malformed JSON: {}", operation, e),
        })
    }

    fn group_url(&self, player: GameId, group: &str, context: Option<&str>) -> Url {
        let mut url = self.url(&["players", &player.to_string(), "groups", group]);
        if let Some(context) = context {
            url.query_pairs_mut().append_pair("context", context);
        }
        url
    }

    async fn write_group(
        &self,
        method: Method,
        player: GameId,
        group: &str,
        context: Option<&str>,
    ) -> Result<(), BackendError> {
        let url = self.group_url(player, group, context);
        match self.send(self.request(method, url), "permissions", "group change").await? {
            Some(_) => Ok(()),
            None => Err(BackendError::UnknownGroup { group: group.to_string() }),
        }
    }
}

#[async_trait]
impl PermissionBackend for GameBridge {
    async fn has_group(
        &self,
        player: GameId,
        group: &str,
        context: Option<&str>,
    ) -> Result<bool, BackendError> {
        let url = self.group_url(player, group, context);
        match self.send(self.request(Method::GET, url), "permissions", "group lookup").await? {
            Some(response) => Ok(Self::json::<MemberResponse>(response, "group lookup").await?.member),
            None => Err(BackendError::UnknownGroup { group: group.to_string() }),
        }
    }

    async fn add_group(
        &self,
        player: GameId,
        group: &str,
        context: Option<&str>,
    ) -> Result<(), BackendError> {
        self.write_group(Method::PUT, player, group, context).await
    }

    async fn remove_group(
        &self,
        player: GameId,
        group: &str,
        context: Option<&str>,
    ) -> Result<(), BackendError> {
        self.write_group(Method::DELETE, player, group, context).await
    }
}

#[async_trait]
impl PunishmentIntegration for GameBridge {
    async fn get_punishment(
        &self,
        kind: PunishmentKind,
        player: GameId,
    ) -> Result<Option<Punishment>, BackendError> {
        let url = self.url(&["players", &player.to_string(), "punishments", kind.as_str()]);
        match self.send(self.request(Method::GET, url), kind.as_str(), "punishment lookup").await? {
            Some(response) => Ok(Some(Self::json(response, "punishment lookup").await?)),
            None => Ok(None),
        }
    }

    async fn add_punishment(
        &self,
        kind: PunishmentKind,
        player: GameId,
        punishment: &Punishment,
    ) -> Result<(), BackendError> {
        let url = self.url(&["players", &player.to_string(), "punishments", kind.as_str()]);
        let req = self.request(Method::PUT, url).json(punishment);
        self.send(req, kind.as_str(), "punishment add").await.map(|_| ())
    }

    async fn remove_punishment(
        &self,
        kind: PunishmentKind,
        player: GameId,
    ) -> Result<(), BackendError> {
        let url = self.url(&["players", &player.to_string(), "punishments", kind.as_str()]);
        self.send(self.request(Method::DELETE, url), kind.as_str(), "punishment removal")
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl PlayerDirectory for GameBridge {
    async fn is_online(&self, player: GameId) -> Result<bool, BackendError> {
        let url = self.url(&["players", &player.to_string(), "online"]);
        match self.send(self.request(Method::GET, url), "presence", "presence lookup").await? {
            Some(response) => Ok(Self::json::<OnlineResponse>(response, "presence lookup").await?.online),
            None => Ok(false),
        }
    }

    async fn online_players(&self) -> Result<Vec<GameId>, BackendError> {
        let url = self.url(&["players", "online"]);
        match self.send(self.request(Method::GET, url), "presence", "online list").await? {
            Some(response) => {
                Ok(Self::json::<OnlinePlayersResponse>(response, "online list").await?.players)
            },
            None => Ok(Vec::new()),
        }
    }

    async fn nickname(&self, player: GameId) -> Result<Option<String>, BackendError> {
        let url = self.url(&["players", &player.to_string(), "nickname"]);
        match self.send(self.request(Method::GET, url), "nickname", "nickname lookup").await? {
            Some(response) => Ok(Self::json::<NicknameBody>(response, "nickname lookup")
                .await?
                .nickname
                .filter(|n| !n.is_empty())),
            None => Ok(None),
        }
    }

    async fn set_nickname(
        &self,
        player: GameId,
        nickname: Option<&str>,
    ) -> Result<(), BackendError> {
        let url = self.url(&["players", &player.to_string(), "nickname"]);
        let body = NicknameBody { nickname: nickname.map(str::to_string) };
        let req = self.request(Method::PUT, url).json(&body);
        match self.send(req, "nickname", "nickname change").await? {
            Some(_) => Ok(()),
            None => Err(BackendError::Failed { message: format!("player {} is unknown", player) }),
        }
    }
}
