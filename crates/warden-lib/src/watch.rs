//! Watch loop driving restart admission
//!
//! Subscribes to the live pod change stream, filters to pods newly
//! requesting a restart, and runs each request through a fresh census and
//! the admission policy before firing the restart trigger. The whole cycle
//! sits inside a reconnect shell: stream expiry re-establishes the watch
//! immediately, stream failure sleeps a fixed backoff and reconnects from
//! scratch, indefinitely.
//!
//! Events are processed strictly one at a time, in stream order. The
//! census read and trigger action for one event happen-before the next
//! event's census read, so admission decisions never race each other.

use crate::admission;
use crate::census::Census;
use crate::gateway::PodGateway;
use crate::health::{components, ComponentStatus, HealthRegistry};
use crate::models::{ChangeKind, PodChange};
use crate::observability::{StructuredLogger, WardenMetrics};
use crate::trigger::RestartTrigger;
use anyhow::Result;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Configuration for the watch loop
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Namespace the warden operates in (log context)
    pub namespace: String,
    /// Maximum fraction of the fleet allowed to restart concurrently
    pub max_restart_fraction: f64,
    /// Fixed delay before reconnecting after a stream failure
    pub reconnect_backoff: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            max_restart_fraction: 0.25,
            reconnect_backoff: Duration::from_secs(10),
        }
    }
}

/// Connection state of the watch subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Connecting,
    Streaming,
    Disconnected,
}

impl WatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchState::Connecting => "connecting",
            WatchState::Streaming => "streaming",
            WatchState::Disconnected => "disconnected",
        }
    }
}

/// The admission decision loop over a pod change stream
pub struct WatchLoop {
    gateway: Arc<dyn PodGateway>,
    census: Census,
    trigger: RestartTrigger,
    config: WatchConfig,
    health: HealthRegistry,
    metrics: WardenMetrics,
    logger: StructuredLogger,
}

impl WatchLoop {
    pub fn new(gateway: Arc<dyn PodGateway>, config: WatchConfig, health: HealthRegistry) -> Self {
        Self {
            census: Census::new(Arc::clone(&gateway)),
            trigger: RestartTrigger::new(Arc::clone(&gateway)),
            logger: StructuredLogger::new(&config.namespace),
            metrics: WardenMetrics::new(),
            gateway,
            config,
            health,
        }
    }

    /// Drive the loop until shutdown. It never terminates on its own:
    /// every stream failure is retried after the fixed backoff, with no
    /// attempt ceiling.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            namespace = %self.config.namespace,
            max_restart_fraction = self.config.max_restart_fraction,
            "Starting watch loop"
        );

        loop {
            let result = tokio::select! {
                _ = shutdown.recv() => break,
                result = self.stream_once() => result,
            };

            match result {
                Ok(()) => {
                    // Server-side timeout expired; reconnect right away
                    debug!("Watch stream expired, re-establishing");
                }
                Err(e) => {
                    self.transition(WatchState::Disconnected, Some(e.to_string()))
                        .await;
                    self.metrics.inc_watch_reconnects();
                    warn!(
                        error = %e,
                        backoff_secs = self.config.reconnect_backoff.as_secs_f64(),
                        "Watch stream failed, backing off before reconnect"
                    );
                    let slept = tokio::select! {
                        _ = tokio::time::sleep(self.config.reconnect_backoff) => true,
                        _ = shutdown.recv() => false,
                    };
                    if !slept {
                        break;
                    }
                }
            }
        }

        info!("Shutting down watch loop");
    }

    /// One subscription cycle: connect, then process events until the
    /// stream expires naturally (`Ok`) or fails (`Err`).
    async fn stream_once(&self) -> Result<()> {
        self.transition(WatchState::Connecting, None).await;
        let mut changes = self.gateway.watch_pods().await?;
        self.transition(WatchState::Streaming, None).await;

        while let Some(item) = changes.next().await {
            let change = item?;
            self.handle_change(change).await;
        }

        Ok(())
    }

    /// Run one pod change through the admission pipeline
    async fn handle_change(&self, change: PodChange) {
        if change.kind == ChangeKind::Deleted {
            return;
        }

        let pod = change.pod;
        if !pod.restart_requested() {
            // Not a restart request, or a request already consumed
            return;
        }

        let snapshot = self.census.take().await;
        if snapshot.total == 0 {
            // Fail closed: an empty census is indistinguishable from a
            // failed listing, so never admit against it.
            warn!(pod = %pod.name, "Census matched no pods, skipping admission");
            return;
        }

        let threshold = admission::threshold(snapshot.total, self.config.max_restart_fraction);
        if !admission::admit(
            snapshot.restarting,
            snapshot.total,
            self.config.max_restart_fraction,
        ) {
            self.metrics.inc_denials();
            self.logger
                .log_denial(&pod.name, snapshot.restarting, snapshot.total, threshold);
            return;
        }

        self.metrics.inc_admissions();
        self.logger
            .log_admission(&pod.name, snapshot.restarting, snapshot.total, threshold);
        self.trigger.fire(&pod.name).await;
    }

    async fn transition(&self, state: WatchState, detail: Option<String>) {
        let status = match state {
            WatchState::Connecting | WatchState::Streaming => ComponentStatus::Healthy,
            WatchState::Disconnected => ComponentStatus::Degraded,
        };
        debug!(state = state.as_str(), "Watch state changed");
        self.health
            .set_status(components::WATCHER, status, detail)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::{MockGateway, WatchScript};
    use crate::models::{PodRecord, RESTART_ANNOTATION};
    use std::sync::atomic::Ordering;

    fn plain(name: &str) -> PodRecord {
        PodRecord::new(name)
    }

    fn requesting(name: &str) -> PodRecord {
        let mut pod = PodRecord::new(name);
        pod.annotations
            .insert(RESTART_ANNOTATION.to_string(), "true".to_string());
        pod
    }

    fn request_event(name: &str) -> PodChange {
        PodChange {
            kind: ChangeKind::Modified,
            pod: requesting(name),
        }
    }

    fn test_config() -> WatchConfig {
        WatchConfig {
            namespace: "test".to_string(),
            max_restart_fraction: 0.25,
            reconnect_backoff: Duration::from_millis(5),
        }
    }

    /// Run the loop against the mock for a short window, then shut down
    async fn drive(gateway: Arc<MockGateway>) {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let watch_loop = WatchLoop::new(
            Arc::clone(&gateway) as Arc<dyn PodGateway>,
            test_config(),
            HealthRegistry::new(),
        );
        let handle = tokio::spawn(watch_loop.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_idle_fleet_request_is_admitted() {
        // 4 pods, none restarting: threshold is 1, the request goes through
        let gateway = Arc::new(MockGateway::with_pods(vec![
            plain("web-0"),
            plain("web-1"),
            plain("web-2"),
            plain("web-3"),
        ]));
        gateway.push_script(WatchScript::Events(vec![request_event("web-0")]));

        drive(Arc::clone(&gateway)).await;

        assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.clear_calls.load(Ordering::SeqCst), 1);
        assert!(gateway.sentinel_present("web-0"));
    }

    #[tokio::test]
    async fn test_busy_fleet_request_is_denied() {
        // One pod of 4 already restarting fills the threshold of 1
        let gateway = Arc::new(MockGateway::with_pods(vec![
            plain("web-0"),
            plain("web-1"),
            plain("web-2"),
            plain("web-3"),
        ]));
        gateway.add_sentinel("web-3");
        gateway.push_script(WatchScript::Events(vec![request_event("web-0")]));

        drive(Arc::clone(&gateway)).await;

        assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(gateway.clear_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_census_fails_closed() {
        let gateway = Arc::new(MockGateway::default());
        gateway.push_script(WatchScript::Events(vec![request_event("web-0")]));

        drive(Arc::clone(&gateway)).await;

        assert!(gateway.list_calls.load(Ordering::SeqCst) >= 1);
        assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(gateway.clear_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_census_fails_closed() {
        let gateway = Arc::new(MockGateway {
            fail_list: true,
            ..Default::default()
        });
        gateway.push_script(WatchScript::Events(vec![request_event("web-0")]));

        drive(Arc::clone(&gateway)).await;

        assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_request_events_skip_census() {
        let gateway = Arc::new(MockGateway::with_pods(vec![plain("web-0")]));
        let mut consumed = requesting("web-1");
        consumed
            .annotations
            .insert(RESTART_ANNOTATION.to_string(), "false".to_string());
        gateway.push_script(WatchScript::Events(vec![
            PodChange {
                kind: ChangeKind::Added,
                pod: plain("web-0"),
            },
            PodChange {
                kind: ChangeKind::Modified,
                pod: consumed,
            },
            // A deleted pod never triggers admission, whatever it carries
            PodChange {
                kind: ChangeKind::Deleted,
                pod: requesting("web-2"),
            },
        ]));

        drive(Arc::clone(&gateway)).await;

        assert_eq!(gateway.list_calls.load(Ordering::SeqCst), 0);
        assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stream_failure_backs_off_and_reconnects() {
        let gateway = Arc::new(MockGateway::default());
        gateway.push_script(WatchScript::Fail("connection reset"));

        drive(Arc::clone(&gateway)).await;

        // First watch failed; the loop slept the fixed backoff and opened
        // at least one fresh subscription instead of exiting
        assert!(gateway.watch_calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_stream_expiry_reconnects_immediately() {
        let gateway = Arc::new(MockGateway::default());
        gateway.push_script(WatchScript::Events(vec![]));

        drive(Arc::clone(&gateway)).await;

        assert!(gateway.watch_calls.load(Ordering::SeqCst) >= 2);
    }
}
