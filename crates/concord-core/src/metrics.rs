//! Prometheus metrics for sync observability.
//!
//! - `concord_sync_results_total{kind,result,category}` - Counter of entry outcomes
//! - `concord_loop_suppressed_total{kind}` - Counter of notifications dropped by the loop guard
//! - `concord_resync_duration_seconds{kind}` - Histogram of single resync durations
//! - `concord_loop_guard_markers` - Gauge of live loop-guard markers

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

use concord_types::{SyncKind, SyncResult};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Resyncs are dominated by one or two REST round trips.
const RESYNC_LATENCY_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0];

/// Install the Prometheus recorder once and return its handle.
///
/// Returns `None` when another recorder is already installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Some(handle.clone());
    }

    let builder = match PrometheusBuilder::new().set_buckets(RESYNC_LATENCY_BUCKETS) {
        Ok(builder) => builder,
        Err(e) => {
            tracing::warn!("[Metrics] Invalid histogram buckets: {}", e);
            return None;
        },
    };
    let handle = match builder.install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!("[Metrics] Recorder not installed: {}", e);
            return None;
        },
    };

    describe_counter!("concord_sync_results_total", "Sync entry outcomes by kind and result");
    describe_counter!(
        "concord_loop_suppressed_total",
        "Change notifications suppressed as self-caused"
    );
    describe_histogram!("concord_resync_duration_seconds", "Single resync duration in seconds");
    describe_gauge!("concord_loop_guard_markers", "Live loop-guard markers");

    Some(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Render all metrics in the Prometheus text format.
pub fn render_metrics() -> String {
    PROMETHEUS_HANDLE.get().map(PrometheusHandle::render).unwrap_or_default()
}

pub fn record_result(kind: SyncKind, result: SyncResult) {
    let labels = [
        ("kind", kind.as_str().to_string()),
        ("result", result.label().to_string()),
        ("category", result.category().as_str().to_string()),
    ];
    counter!("concord_sync_results_total", &labels).increment(1);
}

pub fn record_suppressed(kind: SyncKind) {
    counter!("concord_loop_suppressed_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_resync_duration(kind: SyncKind, seconds: f64) {
    histogram!("concord_resync_duration_seconds", "kind" => kind.as_str()).record(seconds);
}

pub fn set_guard_markers(count: usize) {
    gauge!("concord_loop_guard_markers").set(count as f64);
}
