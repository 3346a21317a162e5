//! Pod census
//!
//! Counts how many pods in the matched set are currently restarting versus
//! how many exist, by consulting two independent signals per pod: the
//! restart-request annotation and a remote sentinel-file probe. Every call
//! re-reads live state; nothing is cached between decisions.

use crate::gateway::PodGateway;
use crate::models::{CensusSnapshot, PodRecord};
use crate::observability::WardenMetrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Live census over the configured selector set
pub struct Census {
    gateway: Arc<dyn PodGateway>,
    metrics: WardenMetrics,
}

impl Census {
    pub fn new(gateway: Arc<dyn PodGateway>) -> Self {
        Self {
            gateway,
            metrics: WardenMetrics::new(),
        }
    }

    /// Take one snapshot of the fleet.
    ///
    /// If the listing itself fails, returns the unknown `(0, 0)` snapshot;
    /// callers must not read that as "zero pods restarting with certainty".
    pub async fn take(&self) -> CensusSnapshot {
        let start = Instant::now();

        let pods = match self.gateway.list_pods().await {
            Ok(pods) => pods,
            Err(e) => {
                error!(error = %e, "Failed to list pods, census is unknown");
                return CensusSnapshot::unknown();
            }
        };

        let total = pods.len();
        let mut restarting = 0;
        for pod in &pods {
            if self.is_restarting(pod).await {
                restarting += 1;
            }
        }

        self.metrics
            .observe_census_latency(start.elapsed().as_secs_f64());
        self.metrics
            .set_fleet_counts(restarting as i64, total as i64);
        debug!(restarting, total, "Census complete");

        CensusSnapshot { restarting, total }
    }

    /// A pod is restarting if it carries a live restart request, or the
    /// sentinel is already planted. The annotation check short-circuits
    /// the remote probe.
    async fn is_restarting(&self, pod: &PodRecord) -> bool {
        if pod.restart_requested() {
            return true;
        }

        match self.gateway.sentinel_exists(&pod.name).await {
            Ok(exists) => exists,
            Err(e) => {
                // An unreachable pod must not stall throttling for the
                // rest of the fleet: count it as not restarting.
                debug!(pod = %pod.name, error = %e, "Sentinel probe failed");
                false
            }
        }
    }
}
