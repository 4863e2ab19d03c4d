//! Platform adapters implementing the collaborator seams.
//!
//! - **`discord`** - Discord REST v10 client (`DiscordClient`)
//! - **`bridge`** - HTTP bridge to the game-server plugin (permissions,
//!   punishments, presence)
//! - **`sqlite`** - Account links in a local SQLite file (`LinkStore`)
//! - **`memory`** - In-memory collaborators with call counters

pub mod bridge;
pub mod discord;
pub mod memory;
pub mod sqlite;

pub use bridge::GameBridge;
pub use discord::DiscordRest;
pub use sqlite::SqliteLinkStore;

use reqwest::Client;
use std::time::Duration;

/// Shared builder with keepalive settings.
pub(crate) fn build_http_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .tcp_nodelay(true)
        .http2_keep_alive_interval(Duration::from_secs(25))
        .http2_keep_alive_timeout(Duration::from_secs(10))
        .http2_keep_alive_while_idle(true)
        .build()
}

/// Base URL with credentials stripped, for logs.
pub(crate) fn redact_url(raw: &str) -> String {
    url::Url::parse(raw)
        .map(|u| match u.port() {
            Some(port) => format!("{}://{}:{}", u.scheme(), u.host_str().unwrap_or("?"), port),
            None => format!("{}://{}", u.scheme(), u.host_str().unwrap_or("?")),
        })
        .unwrap_or_else(|_| "<invalid-url>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_url() {
        assert_eq!(redact_url("http://user:pw@127.0.0.1:8095/api"), "http://127.0.0.1:8095");
        assert_eq!(redact_url("https://discord.com/api/v10"), "https://discord.com");
        assert_eq!(redact_url("not a url"), "<invalid-url>");
    }
}
