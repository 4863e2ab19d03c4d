//! Background Schedulers
//!
//! ## Timer Resync
//! Periodically resyncs every online, linked player with the `timer` cause.
//!
//! Features:
//! - Enabled via `timer.enabled`, interval via `timer.interval_minutes`
//! - Both are re-read every tick, so a config reload takes effect without a
//!   restart
//!
//! ## Loop Guard Cleanup
//! Drops expired loop-suppression markers and refreshes the marker gauge.

use std::time::{Duration, Instant};
use tokio::time::interval;

use concord_types::{ResyncStatus, ResyncSummary, SyncCause};

use crate::state::AppState;

const TIMER_CHECK_SECS: u64 = 60;
const GUARD_CLEANUP_SECS: u64 = 30;

/// When the last timer resync started.
#[derive(Debug, Default)]
pub struct TimerState {
    last_run: Option<Instant>,
}

impl TimerState {
    pub fn is_due(&self, now: Instant, every: Duration) -> bool {
        self.last_run.is_none_or(|last| now.saturating_duration_since(last) >= every)
    }

    pub fn record_run(&mut self, at: Instant) {
        self.last_run = Some(at);
    }
}

/// One scheduler tick. Returns the summary when a resync ran.
pub async fn timer_tick(state: &AppState, timer: &mut TimerState) -> Option<ResyncSummary> {
    let config = state.engine().config();
    if !config.timer.enabled || !config.any_module_enabled() {
        return None;
    }

    let now = Instant::now();
    let every = Duration::from_secs(u64::from(config.timer.interval_minutes) * 60);
    if !timer.is_due(now, every) {
        return None;
    }
    timer.record_run(now);

    let summary = state.engine().resync_online(SyncCause::TIMER).await;
    match summary.status {
        ResyncStatus::Success => tracing::info!(
            "[Scheduler] timer resync: {} players, {} results in {} ms",
            summary.identities,
            summary.total,
            summary.duration_ms
        ),
        ResyncStatus::PartialFailure | ResyncStatus::Failure => tracing::warn!(
            "[Scheduler] timer resync {:?}: {} players, {} failures",
            summary.status,
            summary.identities,
            summary.failures.len()
        ),
    }
    Some(summary)
}

/// Start the timer resync scheduler as a background tokio task
pub fn start_timer(state: AppState) {
    tokio::spawn(async move {
        tracing::info!("[Scheduler] Timer resync scheduler started");

        let mut check_interval = interval(Duration::from_secs(TIMER_CHECK_SECS));
        let mut timer = TimerState::default();
        loop {
            check_interval.tick().await;
            let _summary = timer_tick(&state, &mut timer).await;
        }
    });
}

pub fn start_guard_cleanup(state: AppState) {
    tokio::spawn(async move {
        let mut cleanup_interval = interval(Duration::from_secs(GUARD_CLEANUP_SECS));
        loop {
            cleanup_interval.tick().await;
            let removed = state.engine().cleanup_guard();
            if removed > 0 {
                tracing::debug!("[Scheduler] Cleaned up {} expired loop-guard markers", removed);
            }
        }
    });
}
