//! Discord REST v10 client.
//!
//! JSON error codes are mapped onto [`DiscordError`]:
//! 10004 unknown guild, 10007/10013 unknown member/user, 10011 unknown role,
//! 10026 unknown ban (read as "not banned"), 50013 missing permissions.
//! Transport failures and a rejected token are `NoConnection`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use concord_types::models::DiscordConfig;
use concord_types::{DiscordError, DiscordId};

use super::{build_http_client, redact_url};
use crate::error::{AppError, AppResult};
use crate::sync::collaborators::{DiscordBan, DiscordClient};

const UNKNOWN_GUILD: u32 = 10004;
const UNKNOWN_MEMBER: u32 = 10007;
const UNKNOWN_ROLE: u32 = 10011;
const UNKNOWN_USER: u32 = 10013;
const UNKNOWN_BAN: u32 = 10026;
const MISSING_PERMISSIONS: u32 = 50013;

const AUDIT_LOG_REASON: &str = "X-Audit-Log-Reason";

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct RoleObject {
    id: DiscordId,
}

#[derive(Debug, Deserialize)]
struct MemberObject {
    #[serde(default)]
    roles: Vec<DiscordId>,
    #[serde(default)]
    nick: Option<String>,
    #[serde(default)]
    communication_disabled_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct BanObject {
    #[serde(default)]
    reason: Option<String>,
}

/// What a request was about, for error mapping.
#[derive(Debug, Clone, Copy)]
struct Call {
    action: &'static str,
    guild: DiscordId,
    user: Option<DiscordId>,
    role: Option<DiscordId>,
}

impl Call {
    const fn guild(action: &'static str, guild: DiscordId) -> Self {
        Self { action, guild, user: None, role: None }
    }

    const fn member(action: &'static str, guild: DiscordId, user: DiscordId) -> Self {
        Self { action, guild, user: Some(user), role: None }
    }

    const fn with_role(mut self, role: DiscordId) -> Self {
        self.role = Some(role);
        self
    }
}

fn map_api_error(status: StatusCode, body: &str, call: Call) -> DiscordError {
    let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();
    let code = parsed.as_ref().map_or(0, |b| b.code);
    let message = parsed.map_or_else(|| body.to_string(), |b| b.message);

    match (status, code) {
        (StatusCode::UNAUTHORIZED, _) => {
            DiscordError::NoConnection { message: format!("token rejected: {}", message) }
        },
        (_, UNKNOWN_GUILD) => DiscordError::GuildMissing { guild_id: call.guild.get() },
        (_, UNKNOWN_MEMBER | UNKNOWN_USER) => {
            DiscordError::NotAMember { user_id: call.user.map_or(0, DiscordId::get) }
        },
        (_, UNKNOWN_ROLE) => {
            DiscordError::RoleMissing { role_id: call.role.map_or(0, DiscordId::get) }
        },
        (_, MISSING_PERMISSIONS) => {
            DiscordError::MissingPermission { action: call.action.to_string() }
        },
        _ => DiscordError::Api { status: status.as_u16(), message },
    }
}

fn is_unknown_ban(err: &DiscordError, body_code: u32) -> bool {
    matches!(err, DiscordError::Api { status: 404, .. }) && body_code == UNKNOWN_BAN
}

/// Discord REST client bound to one bot token.
pub struct DiscordRest {
    client: Client,
    base_url: String,
    token: String,
}

impl DiscordRest {
    pub fn new(config: &DiscordConfig) -> AppResult<Self> {
        if config.token.trim().is_empty() {
            return Err(AppError::Unknown("discord.token is empty".to_string()));
        }
        let client = build_http_client(config.request_timeout_secs)?;
        tracing::info!("[Discord] REST client for {}", redact_url(&config.api_base_url));
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.token.trim().to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
            .header(
                reqwest::header::USER_AGENT,
                format!("DiscordBot (concord, {})", env!("CARGO_PKG_VERSION")),
            )
    }

    /// Send and split the outcome into a success response or a mapped error
    /// plus the raw Discord error code.
    async fn send(&self, req: RequestBuilder, call: Call) -> Result<Response, (DiscordError, u32)> {
        let response = req.send().await.map_err(|e| {
            tracing::debug!("[Discord] {} transport error: {}", call.action, e);
            (DiscordError::NoConnection { message: e.to_string() }, 0)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let code = serde_json::from_str::<ApiErrorBody>(&body).map_or(0, |b| b.code);
        let err = map_api_error(status, &body, call);
        tracing::debug!("[Discord] {} failed ({}): {}", call.action, status, err);
        Err((err, code))
    }

    async fn execute(&self, req: RequestBuilder, call: Call) -> Result<Response, DiscordError> {
        self.send(req, call).await.map_err(|(err, _)| err)
    }

    async fn member(
        &self,
        guild: DiscordId,
        user: DiscordId,
        action: &'static str,
    ) -> Result<MemberObject, DiscordError> {
        let path = format!("/guilds/{}/members/{}", guild, user);
        let response =
            self.execute(self.request(Method::GET, &path), Call::member(action, guild, user)).await?;
        response
            .json::<MemberObject>()
            .await
            .map_err(|e| DiscordError::Api { status: 200, message: format!("bad member object: {}", e) })
    }

    async fn patch_member(
        &self,
        guild: DiscordId,
        user: DiscordId,
        body: serde_json::Value,
        reason: Option<&str>,
        action: &'static str,
    ) -> Result<(), DiscordError> {
        let path = format!("/guilds/{}/members/{}", guild, user);
        let req = with_reason(self.request(Method::PATCH, &path).json(&body), reason);
        self.execute(req, Call::member(action, guild, user)).await.map(|_| ())
    }
}

fn with_reason(req: RequestBuilder, reason: Option<&str>) -> RequestBuilder {
    match reason.filter(|r| !r.is_empty()) {
        Some(reason) => {
            let encoded: String = url::form_urlencoded::byte_serialize(reason.as_bytes()).collect();
            req.header(AUDIT_LOG_REASON, encoded)
        },
        None => req,
    }
}

#[async_trait]
impl DiscordClient for DiscordRest {
    async fn role_exists(&self, guild: DiscordId, role: DiscordId) -> Result<bool, DiscordError> {
        let path = format!("/guilds/{}/roles", guild);
        let call = Call::guild("list roles", guild).with_role(role);
        let roles: Vec<RoleObject> = self
            .execute(self.request(Method::GET, &path), call)
            .await?
            .json()
            .await
            .map_err(|e| DiscordError::Api { status: 200, message: format!("bad role list: {}", e) })?;
        Ok(roles.iter().any(|r| r.id == role))
    }

    async fn has_role(
        &self,
        guild: DiscordId,
        user: DiscordId,
        role: DiscordId,
    ) -> Result<bool, DiscordError> {
        let member = self.member(guild, user, "read member").await?;
        Ok(member.roles.contains(&role))
    }

    async fn add_role(
        &self,
        guild: DiscordId,
        user: DiscordId,
        role: DiscordId,
    ) -> Result<(), DiscordError> {
        let path = format!("/guilds/{}/members/{}/roles/{}", guild, user, role);
        let call = Call::member("manage roles", guild, user).with_role(role);
        self.execute(self.request(Method::PUT, &path), call).await.map(|_| ())
    }

    async fn remove_role(
        &self,
        guild: DiscordId,
        user: DiscordId,
        role: DiscordId,
    ) -> Result<(), DiscordError> {
        let path = format!("/guilds/{}/members/{}/roles/{}", guild, user, role);
        let call = Call::member("manage roles", guild, user).with_role(role);
        self.execute(self.request(Method::DELETE, &path), call).await.map(|_| ())
    }

    async fn get_ban(
        &self,
        guild: DiscordId,
        user: DiscordId,
    ) -> Result<Option<DiscordBan>, DiscordError> {
        let path = format!("/guilds/{}/bans/{}", guild, user);
        let call = Call::member("read bans", guild, user);
        match self.send(self.request(Method::GET, &path), call).await {
            Ok(response) => {
                let ban: BanObject = response.json().await.map_err(|e| DiscordError::Api {
                    status: 200,
                    message: format!("bad ban object: {}", e),
                })?;
                Ok(Some(DiscordBan { reason: ban.reason }))
            },
            Err((err, code)) if is_unknown_ban(&err, code) => Ok(None),
            Err((err, _)) => Err(err),
        }
    }

    async fn ban(
        &self,
        guild: DiscordId,
        user: DiscordId,
        reason: Option<&str>,
        delete_message_seconds: u32,
    ) -> Result<(), DiscordError> {
        let path = format!("/guilds/{}/bans/{}", guild, user);
        let body = json!({ "delete_message_seconds": delete_message_seconds });
        let req = with_reason(self.request(Method::PUT, &path).json(&body), reason);
        self.execute(req, Call::member("ban members", guild, user)).await.map(|_| ())
    }

    async fn unban(&self, guild: DiscordId, user: DiscordId) -> Result<(), DiscordError> {
        let path = format!("/guilds/{}/bans/{}", guild, user);
        let call = Call::member("ban members", guild, user);
        match self.send(self.request(Method::DELETE, &path), call).await {
            Ok(_) => Ok(()),
            Err((err, code)) if is_unknown_ban(&err, code) => Ok(()),
            Err((err, _)) => Err(err),
        }
    }

    async fn get_timeout(
        &self,
        guild: DiscordId,
        user: DiscordId,
    ) -> Result<Option<DateTime<Utc>>, DiscordError> {
        let member = self.member(guild, user, "read member").await?;
        Ok(member.communication_disabled_until)
    }

    async fn set_timeout(
        &self,
        guild: DiscordId,
        user: DiscordId,
        until: DateTime<Utc>,
        reason: Option<&str>,
    ) -> Result<(), DiscordError> {
        let body = json!({ "communication_disabled_until": until.to_rfc3339() });
        self.patch_member(guild, user, body, reason, "moderate members").await
    }

    async fn clear_timeout(&self, guild: DiscordId, user: DiscordId) -> Result<(), DiscordError> {
        let body = json!({ "communication_disabled_until": null });
        self.patch_member(guild, user, body, None, "moderate members").await
    }

    async fn nickname(
        &self,
        guild: DiscordId,
        user: DiscordId,
    ) -> Result<Option<String>, DiscordError> {
        let member = self.member(guild, user, "read member").await?;
        Ok(member.nick.filter(|n| !n.is_empty()))
    }

    async fn set_nickname(
        &self,
        guild: DiscordId,
        user: DiscordId,
        nickname: Option<&str>,
    ) -> Result<(), DiscordError> {
        let body = json!({ "nick": nickname });
        self.patch_member(guild, user, body, None, "manage nicknames").await
    }
}
