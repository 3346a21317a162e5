//! Kubernetes-backed gateway
//!
//! Implements [`PodGateway`] over an `Api<Pod>`: label-selector listing,
//! a raw watch with a server-side timeout, exec-based sentinel probes, and
//! the merge-patch that consumes a restart request. Watches always start
//! from revision "0" — reconnects carry no resumption cursor, so delivery
//! is level-triggered rather than edge-triggered.

use super::{GatewayError, PodChangeStream, PodGateway};
use crate::models::{ChangeKind, PodChange, PodRecord, RESTART_ANNOTATION};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, AttachParams, ListParams, Patch, PatchParams, WatchEvent, WatchParams};
use kube::Client;
use serde_json::json;
use tracing::{debug, warn};

/// Configuration for the Kubernetes gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Namespace the managed workload group lives in
    pub namespace: String,
    /// Label selector matching the managed pods
    pub label_selector: String,
    /// Path of the restart sentinel file inside each pod
    pub sentinel_path: String,
    /// Server-side watch timeout; the stream expires and is re-opened
    pub watch_timeout_secs: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            label_selector: "restart-warden/managed=true".to_string(),
            sentinel_path: "/var/run/restart-allowed".to_string(),
            watch_timeout_secs: 60,
        }
    }
}

/// Production gateway over the Kubernetes API
pub struct KubeGateway {
    pods: Api<Pod>,
    config: GatewayConfig,
}

impl KubeGateway {
    /// Create a gateway scoped to the configured namespace
    pub fn new(client: Client, config: GatewayConfig) -> Self {
        Self {
            pods: Api::namespaced(client, &config.namespace),
            config,
        }
    }

    /// Run a command inside the pod and report whether it exited 0.
    ///
    /// A missing status frame is reported as failure: the caller cannot
    /// tell success from a dropped channel, so it must not assume success.
    async fn exec_succeeds(
        &self,
        pod_name: &str,
        command: Vec<String>,
    ) -> Result<bool, GatewayError> {
        let params = AttachParams::default().stdout(false).stderr(false);
        let mut attached = self.pods.exec(pod_name, command, &params).await?;
        let status = match attached.take_status() {
            Some(status) => status.await,
            None => None,
        };
        Ok(matches!(status, Some(s) if s.status.as_deref() == Some("Success")))
    }
}

#[async_trait]
impl PodGateway for KubeGateway {
    async fn list_pods(&self) -> Result<Vec<PodRecord>, GatewayError> {
        let params = ListParams::default().labels(&self.config.label_selector);
        let pods = self.pods.list(&params).await?;
        Ok(pods.into_iter().filter_map(pod_record).collect())
    }

    async fn watch_pods(&self) -> Result<PodChangeStream, GatewayError> {
        let params = WatchParams::default()
            .labels(&self.config.label_selector)
            .timeout(self.config.watch_timeout_secs);
        let events = self.pods.watch(&params, "0").await?;

        let changes = events
            .map_err(GatewayError::from)
            .try_filter_map(|event| async move {
                match event {
                    WatchEvent::Added(pod) => Ok(typed_change(ChangeKind::Added, pod)),
                    WatchEvent::Modified(pod) => Ok(typed_change(ChangeKind::Modified, pod)),
                    WatchEvent::Deleted(pod) => Ok(typed_change(ChangeKind::Deleted, pod)),
                    WatchEvent::Bookmark(_) => {
                        debug!("Ignoring bookmark event");
                        Ok(None)
                    }
                    WatchEvent::Error(err) => Err(GatewayError::Stream(format!(
                        "{} (code {})",
                        err.message, err.code
                    ))),
                }
            })
            .boxed();

        Ok(changes)
    }

    async fn sentinel_exists(&self, pod_name: &str) -> Result<bool, GatewayError> {
        let command = vec![
            "test".to_string(),
            "-f".to_string(),
            self.config.sentinel_path.clone(),
        ];
        self.exec_succeeds(pod_name, command).await
    }

    async fn create_sentinel(&self, pod_name: &str) -> Result<(), GatewayError> {
        let command = vec!["touch".to_string(), self.config.sentinel_path.clone()];
        if self.exec_succeeds(pod_name, command).await? {
            Ok(())
        } else {
            Err(GatewayError::Exec {
                pod: pod_name.to_string(),
                message: format!("touch {} reported failure", self.config.sentinel_path),
            })
        }
    }

    async fn clear_restart_request(&self, pod_name: &str) -> Result<(), GatewayError> {
        // A merge-patch with an explicit null deletes the annotation key
        let patch = json!({
            "metadata": {
                "annotations": { RESTART_ANNOTATION: null }
            }
        });
        self.pods
            .patch(pod_name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

/// Convert a platform pod record into the typed boundary shape
fn pod_record(pod: Pod) -> Option<PodRecord> {
    match pod.metadata.name {
        Some(name) => Some(PodRecord {
            name,
            annotations: pod.metadata.annotations.unwrap_or_default(),
        }),
        None => {
            warn!("Ignoring pod record without a name");
            None
        }
    }
}

fn typed_change(kind: ChangeKind, pod: Pod) -> Option<PodChange> {
    pod_record(pod).map(|pod| PodChange { kind, pod })
}
