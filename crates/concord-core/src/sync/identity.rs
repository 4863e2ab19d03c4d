//! Resolves partial identities into linked pairs through the link store.

use std::sync::Arc;

use concord_types::{LinkError, ResolvedSomeone, Someone};

use super::collaborators::LinkStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedSomeone),
    /// The known side has no link
    Unlinked,
}

#[derive(Clone)]
pub struct IdentityResolver {
    links: Arc<dyn LinkStore>,
}

impl IdentityResolver {
    pub fn new(links: Arc<dyn LinkStore>) -> Self {
        Self { links }
    }

    /// Both sides present resolves without touching the store. A store
    /// failure is returned as an error, never as `Unlinked`.
    pub async fn resolve(&self, who: Someone) -> Result<Resolution, LinkError> {
        match who {
            Someone::Resolved(pair) => Ok(Resolution::Resolved(pair)),
            Someone::Game(game_id) => Ok(match self.links.discord_for_game(game_id).await? {
                Some(discord_id) => Resolution::Resolved(ResolvedSomeone::new(game_id, discord_id)),
                None => Resolution::Unlinked,
            }),
            Someone::Discord(discord_id) => {
                Ok(match self.links.game_for_discord(discord_id).await? {
                    Some(game_id) => {
                        Resolution::Resolved(ResolvedSomeone::new(game_id, discord_id))
                    },
                    None => Resolution::Unlinked,
                })
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryLinkStore;
    use concord_types::{DiscordId, GameId};

    #[tokio::test]
    async fn test_resolve_both_sides_skips_store() {
        let store = Arc::new(MemoryLinkStore::new());
        store.set_unavailable(true);
        let resolver = IdentityResolver::new(store.clone());

        let pair = ResolvedSomeone::new(GameId::random(), DiscordId(1));
        let resolution = resolver.resolve(Someone::from(pair)).await.unwrap();
        assert_eq!(resolution, Resolution::Resolved(pair));
        assert_eq!(store.lookups(), 0);
    }

    #[tokio::test]
    async fn test_resolve_either_side() {
        let store = Arc::new(MemoryLinkStore::new());
        let pair = ResolvedSomeone::new(GameId::random(), DiscordId(7));
        store.insert(pair);
        let resolver = IdentityResolver::new(store);

        let by_game = resolver.resolve(Someone::game(pair.game_id)).await.unwrap();
        let by_discord = resolver.resolve(Someone::discord(pair.discord_id)).await.unwrap();
        assert_eq!(by_game, Resolution::Resolved(pair));
        assert_eq!(by_discord, Resolution::Resolved(pair));

        let stranger = resolver.resolve(Someone::discord(DiscordId(8))).await.unwrap();
        assert_eq!(stranger, Resolution::Unlinked);
    }

    #[tokio::test]
    async fn test_store_failure_is_not_unlinked() {
        let store = Arc::new(MemoryLinkStore::new());
        store.set_unavailable(true);
        let resolver = IdentityResolver::new(store);

        let err = resolver.resolve(Someone::game(GameId::random())).await.unwrap_err();
        assert!(err.is_transient());
    }
}
