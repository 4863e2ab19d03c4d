//! Account links in a local SQLite file.
//!
//! One row per linked pair; both columns are unique so a game account and a
//! Discord account can each appear in at most one link.

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use concord_types::{DiscordId, GameId, LinkError, ResolvedSomeone, Someone};

use crate::error::AppResult;
use crate::sync::collaborators::LinkStore;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS links (
    game_id TEXT NOT NULL UNIQUE,
    discord_id TEXT NOT NULL UNIQUE,
    linked_at INTEGER NOT NULL
)";

/// Default location: `<data dir>/links.db`.
pub fn default_links_path() -> AppResult<PathBuf> {
    Ok(crate::config::get_data_dir()?.join("links.db"))
}

#[derive(Clone)]
pub struct SqliteLinkStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLinkStore {
    pub fn open(path: &Path) -> AppResult<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> AppResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> AppResult<Self> {
        let _rows_affected: usize = conn.execute(SCHEMA, [])?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Run a query on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, LinkError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, LinkError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&conn.lock()))
            .await
            .map_err(|e| LinkError::Unavailable { message: format!("link query aborted: {}", e) })?
    }
}

fn unavailable(err: rusqlite::Error) -> LinkError {
    LinkError::Unavailable { message: err.to_string() }
}

fn parse_game(raw: &str) -> Result<GameId, LinkError> {
    raw.parse()
        .map_err(|e| LinkError::Corrupt { message: format!("bad game id {:?}: {}", raw, e) })
}

fn parse_discord(raw: &str) -> Result<DiscordId, LinkError> {
    raw.parse()
        .map_err(|e| LinkError::Corrupt { message: format!("bad discord id {:?}: {}", raw, e) })
}

fn find_pair(
    conn: &Connection,
    game_id: Option<GameId>,
    discord_id: Option<DiscordId>,
) -> Result<Option<ResolvedSomeone>, LinkError> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT game_id, discord_id FROM links WHERE game_id = ?1 OR discord_id = ?2 LIMIT 1",
            params![game_id.map(|g| g.to_string()), discord_id.map(|d| d.to_string())],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(unavailable)?;

    row.map(|(g, d)| Ok(ResolvedSomeone::new(parse_game(&g)?, parse_discord(&d)?))).transpose()
}

#[async_trait]
impl LinkStore for SqliteLinkStore {
    async fn game_for_discord(&self, discord_id: DiscordId) -> Result<Option<GameId>, LinkError> {
        self.with_conn(move |conn| {
            Ok(find_pair(conn, None, Some(discord_id))?.map(|pair| pair.game_id))
        })
        .await
    }

    async fn discord_for_game(&self, game_id: GameId) -> Result<Option<DiscordId>, LinkError> {
        self.with_conn(move |conn| {
            Ok(find_pair(conn, Some(game_id), None)?.map(|pair| pair.discord_id))
        })
        .await
    }

    async fn linked_accounts(&self) -> Result<Vec<ResolvedSomeone>, LinkError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT game_id, discord_id FROM links ORDER BY linked_at, rowid")
                .map_err(unavailable)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
                .map_err(unavailable)?;

            let mut pairs = Vec::new();
            for row in rows {
                let (g, d) = row.map_err(unavailable)?;
                pairs.push(ResolvedSomeone::new(parse_game(&g)?, parse_discord(&d)?));
            }
            Ok(pairs)
        })
        .await
    }

    async fn link(&self, pair: ResolvedSomeone) -> Result<(), LinkError> {
        self.with_conn(move |conn| {
            match find_pair(conn, Some(pair.game_id), Some(pair.discord_id))? {
                Some(existing) if existing == pair => return Ok(()),
                Some(existing) => {
                    let account = if existing.game_id == pair.game_id {
                        pair.game_id.to_string()
                    } else {
                        pair.discord_id.to_string()
                    };
                    return Err(LinkError::AlreadyLinked { account });
                },
                None => {},
            }

            let _rows_affected: usize = conn
                .execute(
                    "INSERT INTO links (game_id, discord_id, linked_at) VALUES (?1, ?2, ?3)",
                    params![
                        pair.game_id.to_string(),
                        pair.discord_id.to_string(),
                        chrono::Utc::now().timestamp()
                    ],
                )
                .map_err(unavailable)?;
            tracing::info!("[Links] linked {}", pair);
            Ok(())
        })
        .await
    }

    async fn unlink(&self, who: Someone) -> Result<Option<ResolvedSomeone>, LinkError> {
        self.with_conn(move |conn| {
            let Some(pair) = find_pair(conn, who.game_id(), who.discord_id())? else {
                return Ok(None);
            };
            let _rows_affected: usize = conn
                .execute(
                    "DELETE FROM links WHERE game_id = ?1 AND discord_id = ?2",
                    params![pair.game_id.to_string(), pair.discord_id.to_string()],
                )
                .map_err(unavailable)?;
            tracing::info!("[Links] unlinked {}", pair);
            Ok(Some(pair))
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pair(d: u64) -> ResolvedSomeone {
        ResolvedSomeone::new(GameId::random(), DiscordId(d))
    }

    #[tokio::test]
    async fn test_link_lookup_both_ways() {
        let store = SqliteLinkStore::open_in_memory().unwrap();
        let a = pair(10);
        store.link(a).await.unwrap();

        assert_eq!(store.game_for_discord(DiscordId(10)).await.unwrap(), Some(a.game_id));
        assert_eq!(store.discord_for_game(a.game_id).await.unwrap(), Some(DiscordId(10)));
        assert_eq!(store.game_for_discord(DiscordId(11)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_link_conflicts_and_relink_is_idempotent() {
        let store = SqliteLinkStore::open_in_memory().unwrap();
        let a = pair(10);
        store.link(a).await.unwrap();
        store.link(a).await.unwrap();

        let taken_discord = ResolvedSomeone::new(GameId::random(), DiscordId(10));
        assert!(matches!(store.link(taken_discord).await, Err(LinkError::AlreadyLinked { .. })));

        let taken_game = ResolvedSomeone::new(a.game_id, DiscordId(12));
        assert!(matches!(store.link(taken_game).await, Err(LinkError::AlreadyLinked { .. })));

        assert_eq!(store.linked_accounts().await.unwrap(), vec![a]);
    }

    #[tokio::test]
    async fn test_unlink_from_either_side() {
        let store = SqliteLinkStore::open_in_memory().unwrap();
        let a = pair(10);
        let b = pair(20);
        store.link(a).await.unwrap();
        store.link(b).await.unwrap();

        assert_eq!(store.unlink(Someone::discord(DiscordId(10))).await.unwrap(), Some(a));
        assert_eq!(store.unlink(Someone::game(b.game_id)).await.unwrap(), Some(b));
        assert_eq!(store.unlink(Someone::game(b.game_id)).await.unwrap(), None);
        assert!(store.linked_accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_links_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.db");
        let a = pair(42);

        SqliteLinkStore::open(&path).unwrap().link(a).await.unwrap();

        let reopened = SqliteLinkStore::open(&path).unwrap();
        assert_eq!(reopened.linked_accounts().await.unwrap(), vec![a]);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_reported() {
        let store = SqliteLinkStore::open_in_memory().unwrap();
        store
            .conn
            .lock()
            .execute(
                "INSERT INTO links (game_id, discord_id, linked_at) VALUES ('nope', '7', 0)",
                [],
            )
            .unwrap();

        assert!(matches!(
            store.game_for_discord(DiscordId(7)).await,
            Err(LinkError::Corrupt { .. })
        ));
    }
}
