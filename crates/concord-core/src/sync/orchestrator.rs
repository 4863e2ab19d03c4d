//! Bulk resyncs: fan `resync` out over identities × kinds and aggregate.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use concord_types::{
    LinkError, ResyncStatus, ResyncSummary, Someone, SyncCause, SyncKind, SyncReport,
};

use super::engine::{EngineSnapshot, SyncEngine};
use super::identity::Resolution;

/// A bulk resync. `None` filters mean "all linked accounts" / "all enabled kinds".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResyncRequest {
    #[serde(default)]
    pub identities: Option<Vec<Someone>>,
    #[serde(default)]
    pub kinds: Option<Vec<SyncKind>>,
    #[serde(default = "default_cause")]
    pub cause: SyncCause,
}

impl ResyncRequest {
    pub fn all(cause: SyncCause) -> Self {
        Self { identities: None, kinds: None, cause }
    }
}

fn default_cause() -> SyncCause {
    SyncCause::COMMAND
}

fn failed_summary(started: Instant) -> ResyncSummary {
    let mut summary = ResyncSummary::default();
    summary.finish(started.elapsed().as_millis() as u64);
    summary.status = ResyncStatus::Failure;
    summary
}

type Resolved = (Someone, Result<Resolution, LinkError>);

impl SyncEngine {
    /// Run a bulk resync with bounded concurrency. Safe to repeat.
    pub async fn resync_many(&self, request: ResyncRequest) -> ResyncSummary {
        let started = Instant::now();
        let snapshot = self.snapshot();
        let kinds = kinds_for(&snapshot, request.kinds.as_deref(), &request.cause);

        let identities = match request.identities {
            Some(identities) => identities,
            None => match self.collaborators().links.linked_accounts().await {
                Ok(pairs) => pairs.into_iter().map(Someone::from).collect(),
                Err(e) => {
                    tracing::error!("[Orchestrator] cannot enumerate linked accounts: {}", e);
                    return failed_summary(started);
                },
            },
        };

        let resolved = self.resolve_many(&snapshot, identities).await;
        self.run_resolved(&snapshot, &resolved, &kinds, &request.cause, started).await
    }

    /// Resync every linked player currently online. Unlinked players are
    /// skipped; a failed link lookup is reported for that player only.
    pub async fn resync_online(&self, cause: SyncCause) -> ResyncSummary {
        let started = Instant::now();
        let snapshot = self.snapshot();
        let Some(players) = self.collaborators().players.clone() else {
            tracing::warn!("[Orchestrator] no player directory, online resync skipped");
            return failed_summary(started);
        };
        let online = match players.online_players().await {
            Ok(online) => online,
            Err(e) => {
                tracing::error!("[Orchestrator] cannot list online players: {}", e);
                return failed_summary(started);
            },
        };

        let mut resolved =
            self.resolve_many(&snapshot, online.into_iter().map(Someone::game).collect()).await;
        resolved.retain(|(_, resolution)| !matches!(resolution, Ok(Resolution::Unlinked)));

        if resolved.is_empty() {
            tracing::debug!("[Orchestrator] no linked players online");
            let mut summary = ResyncSummary::default();
            summary.finish(started.elapsed().as_millis() as u64);
            return summary;
        }

        let kinds = kinds_for(&snapshot, None, &cause);
        self.run_resolved(&snapshot, &resolved, &kinds, &cause, started).await
    }

    /// One link-store lookup per identity, in input order.
    async fn resolve_many(
        &self,
        snapshot: &EngineSnapshot,
        identities: Vec<Someone>,
    ) -> Vec<Resolved> {
        stream::iter(identities)
            .map(|who| async move { (who, self.resolve(who).await) })
            .buffered(concurrency(snapshot))
            .collect()
            .await
    }

    async fn run_resolved(
        &self,
        snapshot: &EngineSnapshot,
        resolved: &[Resolved],
        kinds: &[SyncKind],
        cause: &SyncCause,
        started: Instant,
    ) -> ResyncSummary {
        tracing::info!(
            "[Orchestrator] resyncing {} identities x {} kinds ({})",
            resolved.len(),
            kinds.len(),
            cause
        );

        let jobs: Vec<_> = resolved
            .iter()
            .flat_map(|(who, resolution)| {
                kinds.iter().map(move |kind| (*who, resolution, *kind))
            })
            .map(|(who, resolution, kind)| {
                self.run_kind(snapshot, kind, who, resolution, cause, None)
            })
            .collect();
        let reports: Vec<SyncReport> = stream::iter(jobs)
            .buffer_unordered(concurrency(snapshot))
            .collect()
            .await;

        let mut summary = ResyncSummary { identities: resolved.len(), ..Default::default() };
        for report in &reports {
            summary.record(report);
        }
        summary.finish(started.elapsed().as_millis() as u64);

        tracing::info!(
            "[Orchestrator] finished in {}ms: {} results, {} errors, status {:?}",
            summary.duration_ms,
            summary.total,
            summary.failures.len(),
            summary.status
        );
        summary
    }
}

fn concurrency(snapshot: &EngineSnapshot) -> usize {
    snapshot.config.engine.max_concurrency.max(1)
}

/// Enabled kinds, narrowed by an optional filter and by the cause.
fn kinds_for(
    snapshot: &EngineSnapshot,
    wanted: Option<&[SyncKind]>,
    cause: &SyncCause,
) -> Vec<SyncKind> {
    snapshot
        .enabled_kinds()
        .into_iter()
        .filter(|k| wanted.is_none_or(|wanted| wanted.contains(k)))
        .filter(|k| cause.applies_to(*k))
        .collect()
}
