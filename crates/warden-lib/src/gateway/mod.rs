//! Gateway to the orchestration platform
//!
//! [`PodGateway`] is the seam between the admission pipeline and the
//! Kubernetes API: listing the matched fleet, streaming pod changes,
//! probing and planting the restart sentinel, and consuming request
//! annotations. The production implementation is [`KubeGateway`]; tests
//! substitute mocks behind `Arc<dyn PodGateway>`.

mod kube;
#[cfg(test)]
pub(crate) mod mock;

pub use self::kube::{GatewayConfig, KubeGateway};

use crate::models::{PodChange, PodRecord};
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

/// Errors surfaced at the platform boundary
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The underlying API call failed (network, auth, server error)
    #[error("Kubernetes API call failed: {0}")]
    Api(#[from] ::kube::Error),

    /// A remote command ran but the platform reported it did not succeed
    #[error("exec in pod {pod} failed: {message}")]
    Exec { pod: String, message: String },

    /// The watch stream delivered an error record instead of a pod change
    #[error("watch stream error: {0}")]
    Stream(String),
}

/// Stream of typed pod changes, terminated by the server-side watch timeout
pub type PodChangeStream = BoxStream<'static, Result<PodChange, GatewayError>>;

/// Operations the warden needs from the orchestration platform.
///
/// All methods are best-effort views of live state; nothing is cached on
/// this side of the boundary.
#[async_trait]
pub trait PodGateway: Send + Sync {
    /// List the pods currently matching the configured selector
    async fn list_pods(&self) -> Result<Vec<PodRecord>, GatewayError>;

    /// Open a fresh watch over the matched pods.
    ///
    /// Each call starts a new subscription with no resumption cursor; the
    /// stream ends when the server-side timeout expires.
    async fn watch_pods(&self) -> Result<PodChangeStream, GatewayError>;

    /// Probe whether the restart sentinel file exists inside the pod
    async fn sentinel_exists(&self, pod_name: &str) -> Result<bool, GatewayError>;

    /// Create the restart sentinel file inside the pod
    async fn create_sentinel(&self, pod_name: &str) -> Result<(), GatewayError>;

    /// Remove the pod's restart-request annotation
    async fn clear_restart_request(&self, pod_name: &str) -> Result<(), GatewayError>;
}
