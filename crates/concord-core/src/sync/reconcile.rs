//! The reconciliation algorithm shared by every sync kind.
//!
//! A kind describes each mapping entry through [`SyncEntry`]: how to read and
//! write the state on either side. [`reconcile_entry`] reads both sides
//! concurrently, compares, decides a direction, writes at most one side, and
//! registers a loop-guard marker for the write. A notification that merely
//! echoes such a write is recognised against the marker and yields no outcome.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use concord_types::{
    BackendError, Direction, DiscordError, EntryOutcome, GenericSyncResult, ResolvedSomeone,
    Side, SyncCause, SyncKind, SyncResult, TieBreaker,
};

use super::guard::{LoopGuard, MarkerKey};
use crate::metrics;

/// A failed collaborator call, already classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub result: SyncResult,
    /// Collaborator call that failed
    pub call: &'static str,
    pub detail: String,
}

impl EntryFailure {
    pub fn new(result: impl Into<SyncResult>, call: &'static str, detail: impl fmt::Display) -> Self {
        Self { result: result.into(), call, detail: detail.to_string() }
    }

    pub fn discord(call: &'static str, err: &DiscordError) -> Self {
        let result = match err {
            DiscordError::NoConnection { .. } => GenericSyncResult::NoDiscordConnection,
            DiscordError::GuildMissing { .. } => GenericSyncResult::GuildDoesntExist,
            DiscordError::NotAMember { .. } => GenericSyncResult::NotAGuildMember,
            DiscordError::RoleMissing { .. } => GenericSyncResult::RoleDoesntExist,
            DiscordError::MissingPermission { .. } => GenericSyncResult::DiscordMissingPermission,
            DiscordError::Api { .. } => GenericSyncResult::DiscordRequestFailed,
        };
        Self::new(result, call, err)
    }

    /// Game-side failure. `unavailable` is the kind's "no integration" result.
    pub fn backend(
        call: &'static str,
        err: &BackendError,
        unavailable: SyncResult,
        failed: SyncResult,
    ) -> Self {
        let result = match err {
            BackendError::NotAvailable { .. } => unavailable,
            _ => failed,
        };
        Self::new(result, call, err)
    }

    pub fn into_outcome(
        self,
        label: Option<String>,
        game_term: &str,
        discord_term: &str,
    ) -> EntryOutcome {
        let message = format!(
            "{} ({} failed: {})",
            self.result.format(game_term, discord_term),
            self.call,
            self.detail
        );
        EntryOutcome::new(label, self.result, message)
    }
}

pub type EntryResult<T> = Result<T, EntryFailure>;

/// What to do with one mapping entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    InSync,
    /// The winning side is not the authoritative one
    WrongDirection { winner: Side },
    /// Write `target` to match the other side
    Apply { target: Side },
}

/// Decide the write for a divergent (or agreeing) entry.
///
/// The side a reactive cause observed changing wins; otherwise the
/// authoritative side wins, or the tie breaker under `Bidirectional`.
pub fn decide(
    agree: bool,
    direction: Direction,
    tie_breaker: TieBreaker,
    origin: Option<Side>,
) -> Decision {
    if agree {
        return Decision::InSync;
    }

    let authoritative = direction.authoritative_side();
    let winner = origin.or(authoritative).unwrap_or_else(|| tie_breaker.side());

    match authoritative {
        Some(side) if side != winner => Decision::WrongDirection { winner },
        _ => Decision::Apply { target: winner.opposite() },
    }
}

/// One mapping entry of a sync kind.
#[async_trait]
pub trait SyncEntry: Send + Sync {
    type State: Clone + fmt::Debug + Send + Sync + 'static;

    /// Label of the entry in reports; `None` for single-mapping kinds.
    fn label(&self) -> Option<String> {
        None
    }

    fn direction(&self) -> Direction;

    fn tie_breaker(&self) -> TieBreaker;

    /// Terms substituted for `%g` and `%d` in result messages.
    fn terms(&self) -> (String, String);

    /// Loop-guard entry for writes to `side`.
    fn marker_entry(&self, _side: Side) -> Option<String> {
        None
    }

    fn agree(&self, game: &Self::State, discord: &Self::State) -> bool;

    /// Result reported when both sides agree.
    fn in_sync(&self, state: &Self::State) -> SyncResult;

    async fn read_game(&self, who: ResolvedSomeone) -> EntryResult<Self::State>;

    async fn read_discord(&self, who: ResolvedSomeone) -> EntryResult<Self::State>;

    /// Make the game side match `source` (the Discord state).
    async fn apply_game(&self, who: ResolvedSomeone, source: &Self::State) -> EntryResult<SyncResult>;

    /// Make the Discord side match `source` (the game state).
    async fn apply_discord(
        &self,
        who: ResolvedSomeone,
        source: &Self::State,
    ) -> EntryResult<SyncResult>;
}

/// Per-call context handed to every entry of a resync.
pub struct RunContext<'a> {
    pub kind: SyncKind,
    pub who: ResolvedSomeone,
    pub cause: &'a SyncCause,
    pub guard: &'a LoopGuard,
    pub marker_ttl: Duration,
    /// Side a listener reported changing; set only for notifications, which
    /// are checked against loop-guard markers
    pub echo_of: Option<Side>,
}

impl RunContext<'_> {
    fn subject(&self, side: Side) -> String {
        match side {
            Side::Game => self.who.game_id.to_string(),
            Side::Discord => self.who.discord_id.to_string(),
        }
    }
}

fn failure_outcome<E: SyncEntry + ?Sized>(entry: &E, failure: EntryFailure) -> EntryOutcome {
    let (game, discord) = entry.terms();
    failure.into_outcome(entry.label(), &game, &discord)
}

/// Whether the reported side still holds what the engine wrote there.
fn is_echo<E: SyncEntry + ?Sized>(
    entry: &E,
    ctx: &RunContext<'_>,
    side: Side,
    game: &E::State,
    discord: &E::State,
) -> bool {
    let key = MarkerKey::new(ctx.kind, side, ctx.subject(side), entry.marker_entry(side));
    let Some(marker) = ctx.guard.check(&key) else {
        return false;
    };
    let Some(source) = marker.intended::<E::State>() else {
        return false;
    };
    let still_written = match side {
        Side::Game => entry.agree(game, source),
        Side::Discord => entry.agree(source, discord),
    };
    if !still_written {
        tracing::debug!("[LoopGuard] {} changed again after the engine write", key);
    }
    still_written
}

/// Run the shared algorithm for one entry. Never fails: every collaborator
/// error becomes a typed result. Returns `None` only for a suppressed echo.
pub async fn reconcile_entry<E: SyncEntry + ?Sized>(
    entry: &E,
    ctx: &RunContext<'_>,
) -> Option<EntryOutcome> {
    let (game, discord) = tokio::join!(entry.read_game(ctx.who), entry.read_discord(ctx.who));
    let (game, discord) = match (game, discord) {
        (Ok(game), Ok(discord)) => (game, discord),
        (Err(failure), _) | (_, Err(failure)) => return Some(failure_outcome(entry, failure)),
    };

    if let Some(side) = ctx.echo_of {
        if is_echo(entry, ctx, side, &game, &discord) {
            metrics::record_suppressed(ctx.kind);
            tracing::debug!(
                "{} suppressed echo of engine write on {} side for {}",
                ctx.kind.log_tag(),
                side.as_str(),
                ctx.who
            );
            return None;
        }
    }

    let (game_term, discord_term) = entry.terms();
    let agree = entry.agree(&game, &discord);
    let decision = decide(agree, entry.direction(), entry.tie_breaker(), ctx.cause.origin_side());

    let (target, applied) = match decision {
        Decision::InSync => {
            let result = entry.in_sync(&game);
            return Some(EntryOutcome::new(
                entry.label(),
                result,
                result.format(&game_term, &discord_term),
            ));
        },
        Decision::WrongDirection { winner } => {
            let result = SyncResult::WRONG_DIRECTION;
            let message = format!(
                "{} (winning side {} is not authoritative)",
                result.format(&game_term, &discord_term),
                winner.as_str()
            );
            return Some(EntryOutcome::new(entry.label(), result, message));
        },
        Decision::Apply { target: Side::Game } => {
            (Side::Game, entry.apply_game(ctx.who, &discord).await)
        },
        Decision::Apply { target: Side::Discord } => {
            (Side::Discord, entry.apply_discord(ctx.who, &game).await)
        },
    };

    let outcome = match applied {
        Ok(result) => {
            if result.is_update() {
                let intended = match target {
                    Side::Game => discord,
                    Side::Discord => game,
                };
                let key = MarkerKey::new(
                    ctx.kind,
                    target,
                    ctx.subject(target),
                    entry.marker_entry(target),
                );
                tracing::trace!("[LoopGuard] {} expects {:?}", key, intended);
                ctx.guard.mark(key, intended, ctx.marker_ttl);
            }
            EntryOutcome::new(entry.label(), result, result.format(&game_term, &discord_term))
        },
        Err(failure) => failure_outcome(entry, failure),
    };
    Some(outcome)
}
