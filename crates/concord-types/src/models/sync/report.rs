//! Reports produced by single resyncs and by bulk orchestration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::cause::SyncCause;
use super::result::{ResultCategory, SyncResult};
use crate::models::config::SyncKind;
use crate::models::{ResolvedSomeone, Someone};

/// Result of reconciling one mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOutcome {
    /// Mapping entry label; `None` for kinds with a single implicit mapping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    pub result: SyncResult,
    /// Rendered message or error detail
    pub message: String,
}

impl EntryOutcome {
    pub fn new(entry: Option<String>, result: SyncResult, message: impl Into<String>) -> Self {
        Self { entry, result, message: message.into() }
    }
}

/// Terminal report of one `resync` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub kind: SyncKind,
    /// Identity as requested by the caller
    pub identity: Someone,
    /// Fully resolved identity, when resolution succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedSomeone>,
    pub cause: SyncCause,
    pub outcomes: Vec<EntryOutcome>,
}

impl SyncReport {
    pub fn new(kind: SyncKind, identity: Someone, cause: SyncCause) -> Self {
        Self { kind, identity, resolved: None, cause, outcomes: Vec::new() }
    }

    /// Report carrying a single result that applies to the whole call.
    pub fn single(
        kind: SyncKind,
        identity: Someone,
        cause: SyncCause,
        result: SyncResult,
        message: impl Into<String>,
    ) -> Self {
        let mut report = Self::new(kind, identity, cause);
        report.outcomes.push(EntryOutcome::new(None, result, message));
        report
    }

    #[must_use]
    pub fn with_resolved(mut self, resolved: ResolvedSomeone) -> Self {
        self.resolved = Some(resolved);
        self
    }

    pub fn push(&mut self, outcome: EntryOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn results(&self) -> impl Iterator<Item = SyncResult> + '_ {
        self.outcomes.iter().map(|o| o.result)
    }

    /// First result; convenient for single-mapping kinds.
    pub fn primary(&self) -> Option<SyncResult> {
        self.outcomes.first().map(|o| o.result)
    }

    pub fn has_errors(&self) -> bool {
        self.outcomes.iter().any(|o| o.result.is_error())
    }

    pub fn has_updates(&self) -> bool {
        self.outcomes.iter().any(|o| o.result.is_update())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResyncStatus {
    /// No entry reported an error
    Success,
    /// Some entries reported errors
    PartialFailure,
    /// Every entry reported an error, or nothing could be attempted
    Failure,
}

/// One failing entry captured for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResyncFailure {
    pub kind: SyncKind,
    pub identity: Someone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    pub result: SyncResult,
    pub message: String,
}

/// Aggregate of a bulk resync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResyncSummary {
    pub status: ResyncStatus,
    /// Number of identities considered
    pub identities: usize,
    /// Total entry outcomes aggregated
    pub total: usize,
    pub by_category: BTreeMap<ResultCategory, usize>,
    /// Counts keyed by result code
    pub by_result: BTreeMap<String, usize>,
    pub failures: Vec<ResyncFailure>,
    pub duration_ms: u64,
}

impl Default for ResyncSummary {
    fn default() -> Self {
        Self {
            status: ResyncStatus::Success,
            identities: 0,
            total: 0,
            by_category: BTreeMap::new(),
            by_result: BTreeMap::new(),
            failures: Vec::new(),
            duration_ms: 0,
        }
    }
}

impl ResyncSummary {
    pub fn record(&mut self, report: &SyncReport) {
        for outcome in &report.outcomes {
            self.total += 1;
            *self.by_category.entry(outcome.result.category()).or_default() += 1;
            *self.by_result.entry(outcome.result.label().to_string()).or_default() += 1;
            if outcome.result.is_error() {
                self.failures.push(ResyncFailure {
                    kind: report.kind,
                    identity: report.identity,
                    entry: outcome.entry.clone(),
                    result: outcome.result,
                    message: outcome.message.clone(),
                });
            }
        }
    }

    pub fn count(&self, category: ResultCategory) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }

    pub fn count_result(&self, result: SyncResult) -> usize {
        self.by_result.get(result.label()).copied().unwrap_or(0)
    }

    /// Derive `status` from the recorded counts.
    pub fn finish(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
        let errors = self.count(ResultCategory::Error);
        self.status = if errors == 0 {
            ResyncStatus::Success
        } else if errors == self.total {
            ResyncStatus::Failure
        } else {
            ResyncStatus::PartialFailure
        };
    }
}
