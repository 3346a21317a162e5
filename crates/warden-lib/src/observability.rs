//! Observability infrastructure for the restart warden
//!
//! Provides:
//! - Prometheus metrics (admission outcomes, trigger errors, watch
//!   reconnects, fleet occupancy, census latency)
//! - Structured JSON logging of significant lifecycle events

use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;
use tracing::info;

/// Histogram buckets for census latency (in seconds); a census is one
/// listing plus up to one exec probe per pod, so the tail is long
const CENSUS_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<WardenMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct WardenMetricsInner {
    admissions: IntCounter,
    denials: IntCounter,
    trigger_errors: IntCounter,
    watch_reconnects: IntCounter,
    pods_total: IntGauge,
    pods_restarting: IntGauge,
    census_latency_seconds: Histogram,
}

impl WardenMetricsInner {
    fn new() -> Self {
        Self {
            admissions: register_int_counter!(
                "restart_warden_admissions_total",
                "Restart requests admitted"
            )
            .expect("Failed to register admissions_total"),

            denials: register_int_counter!(
                "restart_warden_denials_total",
                "Restart requests denied by the concurrency bound"
            )
            .expect("Failed to register denials_total"),

            trigger_errors: register_int_counter!(
                "restart_warden_trigger_errors_total",
                "Failed sentinel-creation or annotation-clear attempts"
            )
            .expect("Failed to register trigger_errors_total"),

            watch_reconnects: register_int_counter!(
                "restart_warden_watch_reconnects_total",
                "Watch stream failures followed by a backoff and reconnect"
            )
            .expect("Failed to register watch_reconnects_total"),

            pods_total: register_int_gauge!(
                "restart_warden_pods_total",
                "Pods matched by the selector at the last census"
            )
            .expect("Failed to register pods_total"),

            pods_restarting: register_int_gauge!(
                "restart_warden_pods_restarting",
                "Pods classified as restarting at the last census"
            )
            .expect("Failed to register pods_restarting"),

            census_latency_seconds: register_histogram!(
                "restart_warden_census_latency_seconds",
                "Time spent listing and probing the fleet for one decision",
                CENSUS_BUCKETS.to_vec()
            )
            .expect("Failed to register census_latency_seconds"),
        }
    }
}

/// Warden metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct WardenMetrics {
    _private: (),
}

impl Default for WardenMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl WardenMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(WardenMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &WardenMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn inc_admissions(&self) {
        self.inner().admissions.inc();
    }

    pub fn inc_denials(&self) {
        self.inner().denials.inc();
    }

    pub fn inc_trigger_errors(&self) {
        self.inner().trigger_errors.inc();
    }

    pub fn inc_watch_reconnects(&self) {
        self.inner().watch_reconnects.inc();
    }

    /// Record the occupancy observed by the latest census
    pub fn set_fleet_counts(&self, restarting: i64, total: i64) {
        self.inner().pods_restarting.set(restarting);
        self.inner().pods_total.set(total);
    }

    /// Record how long one census took
    pub fn observe_census_latency(&self, duration_secs: f64) {
        self.inner().census_latency_seconds.observe(duration_secs);
    }
}

/// Structured logger for warden events
///
/// Provides consistent JSON-formatted logging for admission decisions and
/// process lifecycle, keyed by a stable `event` field.
#[derive(Clone)]
pub struct StructuredLogger {
    namespace: String,
}

impl StructuredLogger {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Log process startup
    pub fn log_startup(&self, version: &str) {
        info!(
            event = "startup",
            namespace = %self.namespace,
            version = %version,
            "Restart warden starting"
        );
    }

    /// Log process shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "shutdown",
            namespace = %self.namespace,
            reason = %reason,
            "Restart warden stopping"
        );
    }

    /// Log an admitted restart request
    pub fn log_admission(&self, pod_name: &str, restarting: usize, total: usize, threshold: usize) {
        info!(
            event = "admission_granted",
            namespace = %self.namespace,
            pod = %pod_name,
            restarting = restarting,
            total = total,
            threshold = threshold,
            "Admitting pod restart"
        );
    }

    /// Log a denied restart request; the annotation stays in place so the
    /// pod is reconsidered on a later event
    pub fn log_denial(&self, pod_name: &str, restarting: usize, total: usize, threshold: usize) {
        info!(
            event = "admission_denied",
            namespace = %self.namespace,
            pod = %pod_name,
            restarting = restarting,
            total = total,
            threshold = threshold,
            "Restart throttled, too many pods already restarting"
        );
    }
}
