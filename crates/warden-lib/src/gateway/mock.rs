//! Mock gateway for exercising the admission pipeline without a cluster

use super::{GatewayError, PodChangeStream, PodGateway};
use crate::models::{PodChange, PodRecord, RESTART_ANNOTATION};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted behavior for one `watch_pods` call
pub(crate) enum WatchScript {
    /// Yield these changes, then end the stream (natural expiry)
    Events(Vec<PodChange>),
    /// Yield a single stream error (connection failure mid-stream)
    Fail(&'static str),
}

/// In-memory [`PodGateway`] with per-operation call counters
#[derive(Default)]
pub(crate) struct MockGateway {
    pub(crate) pods: Mutex<Vec<PodRecord>>,
    pub(crate) sentinels: Mutex<HashSet<String>>,
    pub(crate) scripts: Mutex<VecDeque<WatchScript>>,
    pub fail_list: bool,
    pub fail_probe: bool,
    pub fail_create: bool,
    pub fail_clear: bool,
    pub list_calls: AtomicUsize,
    pub probe_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub clear_calls: AtomicUsize,
    pub watch_calls: AtomicUsize,
}

impl MockGateway {
    pub fn with_pods(pods: Vec<PodRecord>) -> Self {
        let gateway = Self::default();
        *gateway.pods.lock().unwrap() = pods;
        gateway
    }

    pub fn set_pods(&self, pods: Vec<PodRecord>) {
        *self.pods.lock().unwrap() = pods;
    }

    pub fn add_sentinel(&self, pod_name: &str) {
        self.sentinels.lock().unwrap().insert(pod_name.to_string());
    }

    pub fn push_script(&self, script: WatchScript) {
        self.scripts.lock().unwrap().push_back(script);
    }

    pub fn sentinel_present(&self, pod_name: &str) -> bool {
        self.sentinels.lock().unwrap().contains(pod_name)
    }

    fn exec_error(pod: &str) -> GatewayError {
        GatewayError::Exec {
            pod: pod.to_string(),
            message: "exec rejected".to_string(),
        }
    }

    fn api_error(message: &str) -> GatewayError {
        GatewayError::Api(kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: message.to_string(),
            reason: "InternalError".to_string(),
            code: 500,
        }))
    }
}

#[async_trait]
impl PodGateway for MockGateway {
    async fn list_pods(&self) -> Result<Vec<PodRecord>, GatewayError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list {
            return Err(Self::api_error("list rejected"));
        }
        Ok(self.pods.lock().unwrap().clone())
    }

    async fn watch_pods(&self) -> Result<PodChangeStream, GatewayError> {
        self.watch_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().unwrap().pop_front();
        match script {
            Some(WatchScript::Events(changes)) => {
                Ok(futures::stream::iter(changes.into_iter().map(Ok)).boxed())
            }
            Some(WatchScript::Fail(message)) => Ok(futures::stream::iter(vec![Err(
                GatewayError::Stream(message.to_string()),
            )])
            .boxed()),
            // Out of scripted behavior: block until the test shuts the loop down
            None => Ok(futures::stream::pending().boxed()),
        }
    }

    async fn sentinel_exists(&self, pod_name: &str) -> Result<bool, GatewayError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_probe {
            return Err(Self::exec_error(pod_name));
        }
        Ok(self.sentinel_present(pod_name))
    }

    async fn create_sentinel(&self, pod_name: &str) -> Result<(), GatewayError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create {
            return Err(Self::exec_error(pod_name));
        }
        self.add_sentinel(pod_name);
        Ok(())
    }

    async fn clear_restart_request(&self, pod_name: &str) -> Result<(), GatewayError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_clear {
            return Err(Self::api_error("patch rejected"));
        }
        let mut pods = self.pods.lock().unwrap();
        if let Some(pod) = pods.iter_mut().find(|p| p.name == pod_name) {
            pod.annotations.remove(RESTART_ANNOTATION);
        }
        Ok(())
    }
}
