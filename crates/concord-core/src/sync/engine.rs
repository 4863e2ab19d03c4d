//! The sync engine: owns the module snapshot, the loop guard, and per-key
//! exclusivity, and turns every `resync` into exactly one [`SyncReport`].

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

use concord_types::{
    AppConfig, ConfigError, GenericSyncResult, LinkError, ResolvedSomeone, Side, Someone,
    SyncCause, SyncKind, SyncReport, SyncResult,
};

use super::collaborators::{Collaborators, DispatchTrigger};
use super::guard::LoopGuard;
use super::identity::{IdentityResolver, Resolution};
use super::inflight::{InFlight, Role};
use super::kinds::{build_modules, ModuleSet, SyncModule};
use super::reconcile::RunContext;
use crate::metrics;

/// Immutable config and modules; replaced as a whole on reload.
pub struct EngineSnapshot {
    pub config: Arc<AppConfig>,
    modules: ModuleSet,
}

impl EngineSnapshot {
    fn build(config: AppConfig, collaborators: &Collaborators) -> Self {
        let modules = build_modules(&config, collaborators);
        Self { config: Arc::new(config), modules }
    }

    fn module(&self, kind: SyncKind) -> Option<&Arc<dyn SyncModule>> {
        self.modules.get(&kind).filter(|m| m.is_enabled())
    }

    pub fn enabled_kinds(&self) -> Vec<SyncKind> {
        self.modules.values().filter(|m| m.is_enabled()).map(|m| m.kind()).collect()
    }

    fn marker_ttl(&self) -> Duration {
        Duration::from_millis(self.config.engine.loop_guard_ttl_ms)
    }
}

/// Kind, identity, the module's scope for the cause (`None` = every entry),
/// and the side a notification is checked against for echoes.
type FlightKey = (SyncKind, ResolvedSomeone, Option<String>, Option<Side>);

struct EngineInner {
    snapshot: RwLock<Arc<EngineSnapshot>>,
    collaborators: Collaborators,
    resolver: IdentityResolver,
    guard: Arc<LoopGuard>,
    in_flight: InFlight<FlightKey, SyncReport>,
}

/// Shared handle to the engine. Cheap to clone.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

impl SyncEngine {
    pub fn new(config: AppConfig, collaborators: Collaborators) -> Self {
        let resolver = IdentityResolver::new(Arc::clone(&collaborators.links));
        let snapshot = EngineSnapshot::build(config, &collaborators);
        tracing::info!("[Engine] started with kinds {:?}", snapshot.enabled_kinds());
        Self {
            inner: Arc::new(EngineInner {
                snapshot: RwLock::new(Arc::new(snapshot)),
                collaborators,
                resolver,
                guard: Arc::new(LoopGuard::new()),
                in_flight: InFlight::new(),
            }),
        }
    }

    /// Validate and install a new config. Running resyncs keep the old one.
    pub fn reload(&self, config: AppConfig) -> Result<(), ConfigError> {
        config.validate_all()?;
        let snapshot = EngineSnapshot::build(config, &self.inner.collaborators);
        tracing::info!("[Engine] config reloaded, kinds {:?}", snapshot.enabled_kinds());
        *self.inner.snapshot.write() = Arc::new(snapshot);
        Ok(())
    }

    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        Arc::clone(&*self.inner.snapshot.read())
    }

    pub fn config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.snapshot().config)
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.inner.collaborators
    }

    pub fn guard(&self) -> &LoopGuard {
        &self.inner.guard
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.len()
    }

    /// Drop expired loop-guard markers; returns how many were removed.
    pub fn cleanup_guard(&self) -> usize {
        let removed = self.inner.guard.cleanup_expired();
        metrics::set_guard_markers(self.inner.guard.len());
        removed
    }

    /// Reconcile one kind for one identity.
    pub async fn resync(&self, who: Someone, kind: SyncKind, cause: SyncCause) -> SyncReport {
        let snapshot = self.snapshot();
        if snapshot.module(kind).is_none() {
            return disabled_report(kind, who, cause);
        }
        let resolution = self.resolve(who).await;
        self.run_kind(&snapshot, kind, who, &resolution, &cause, None).await
    }

    /// Reconcile every enabled kind the cause applies to. Resolves once.
    pub async fn resync_all(&self, who: Someone, cause: SyncCause) -> Vec<SyncReport> {
        self.run_all(who, cause, None).await
    }

    pub(super) async fn resolve(&self, who: Someone) -> Result<Resolution, LinkError> {
        self.inner.resolver.resolve(who).await
    }

    async fn run_all(
        &self,
        who: Someone,
        cause: SyncCause,
        echo_of: Option<Side>,
    ) -> Vec<SyncReport> {
        let snapshot = self.snapshot();
        let kinds: Vec<SyncKind> =
            snapshot.enabled_kinds().into_iter().filter(|k| cause.applies_to(*k)).collect();
        if kinds.is_empty() {
            tracing::debug!("[Engine] no enabled kind handles {} for {}", cause, who);
            return Vec::new();
        }

        let resolution = self.resolve(who).await;
        join_all(
            kinds
                .into_iter()
                .map(|kind| self.run_kind(&snapshot, kind, who, &resolution, &cause, echo_of)),
        )
        .await
    }

    pub(super) async fn run_kind(
        &self,
        snapshot: &EngineSnapshot,
        kind: SyncKind,
        who: Someone,
        resolution: &Result<Resolution, LinkError>,
        cause: &SyncCause,
        echo_of: Option<Side>,
    ) -> SyncReport {
        let Some(module) = snapshot.module(kind).cloned() else {
            return disabled_report(kind, who, cause.clone());
        };
        if !cause.applies_to(kind) {
            tracing::debug!("{} {} does not apply, skipped for {}", kind.log_tag(), cause, who);
            return SyncReport::new(kind, who, cause.clone());
        }

        let resolved = match resolution {
            Ok(Resolution::Resolved(pair)) => *pair,
            Ok(Resolution::Unlinked) => {
                let result = SyncResult::NOT_LINKED;
                let report =
                    SyncReport::single(kind, who, cause.clone(), result, result.template());
                let quiet = cause.is_join() && snapshot.config.engine.quiet_unlinked_joins;
                log_report(&report, quiet);
                metrics::record_result(kind, result);
                return report;
            },
            Err(e) => {
                let result: SyncResult = GenericSyncResult::LinkStoreUnavailable.into();
                let message = format!("{} ({})", result.template(), e);
                let report = SyncReport::single(kind, who, cause.clone(), result, message);
                log_report(&report, false);
                metrics::record_result(kind, result);
                return report;
            },
        };

        let scope = module.flight_scope(cause);
        let guard = Arc::clone(&self.inner.guard);
        let marker_ttl = snapshot.marker_ttl();
        let work_cause = cause.clone();
        let work = async move {
            let started = Instant::now();
            let ctx = RunContext {
                kind,
                who: resolved,
                cause: &work_cause,
                guard: guard.as_ref(),
                marker_ttl,
                echo_of,
            };
            let outcomes = module.reconcile(&ctx).await;

            let mut report = SyncReport::new(kind, who, work_cause.clone()).with_resolved(resolved);
            for outcome in outcomes {
                metrics::record_result(kind, outcome.result);
                report.push(outcome);
            }
            metrics::record_resync_duration(kind, started.elapsed().as_secs_f64());
            log_report(&report, false);
            report
        };

        let abort_cause = cause.clone();
        let on_abort = move || {
            let result: SyncResult = GenericSyncResult::InternalError.into();
            SyncReport::single(kind, who, abort_cause, result, result.template())
                .with_resolved(resolved)
        };

        let (report, role) =
            self.inner.in_flight.run((kind, resolved, scope, echo_of), work, on_abort).await;
        if role == Role::Follower {
            tracing::debug!("{} joined in-flight resync for {}", kind.log_tag(), resolved);
        }
        report
    }
}

#[async_trait]
impl DispatchTrigger for SyncEngine {
    /// Reports that ran nothing (an echo of an engine write, or no matching
    /// entry) are left out.
    async fn notify_changed(&self, who: Someone, cause: SyncCause) -> Vec<SyncReport> {
        let echo_of = cause.origin_side();
        let mut reports = self.run_all(who, cause, echo_of).await;
        reports.retain(|report| !report.outcomes.is_empty());
        reports
    }
}

fn disabled_report(kind: SyncKind, who: Someone, cause: SyncCause) -> SyncReport {
    let result: SyncResult = GenericSyncResult::ModuleDisabled.into();
    SyncReport::single(kind, who, cause, result, result.template())
}

/// Errors at `warn`, writes at `info`, no-ops at `debug`.
fn log_report(report: &SyncReport, quiet: bool) {
    let tag = report.kind.log_tag();
    for outcome in &report.outcomes {
        let entry = outcome.entry.as_deref().unwrap_or("-");
        if quiet || !(outcome.result.is_error() || outcome.result.is_update()) {
            tracing::debug!(
                identity = %report.identity,
                kind = %report.kind,
                cause = %report.cause,
                entry,
                "{} {}: {}",
                tag,
                outcome.result,
                outcome.message
            );
        } else if outcome.result.is_error() {
            tracing::warn!(
                identity = %report.identity,
                kind = %report.kind,
                cause = %report.cause,
                entry,
                "{} {}: {}",
                tag,
                outcome.result,
                outcome.message
            );
        } else {
            tracing::info!(
                identity = %report.identity,
                kind = %report.kind,
                cause = %report.cause,
                entry,
                "{} {}: {}",
                tag,
                outcome.result,
                outcome.message
            );
        }
    }
}
