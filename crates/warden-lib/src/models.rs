//! Core data models for the restart warden

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Annotation a pod sets to request permission to restart.
///
/// The warden only ever acts on the literal value `"true"`; any other value
/// (or absence) means no restart is being requested.
pub const RESTART_ANNOTATION: &str = "needs-restart";

/// A pod as seen at the gateway boundary: the identity and the annotations
/// the admission pipeline consults. No other platform state is carried
/// inward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodRecord {
    pub name: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl PodRecord {
    /// Build a record with no annotations
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: BTreeMap::new(),
        }
    }

    /// Returns true if this pod currently carries a live restart request
    pub fn restart_requested(&self) -> bool {
        self.annotations
            .get(RESTART_ANNOTATION)
            .map(|v| v == "true")
            .unwrap_or(false)
    }
}

/// Kind of change reported by the watch stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

/// A typed watch event. The gateway converts the platform's
/// loosely-structured change records into this shape at the boundary and
/// drops anything it does not recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodChange {
    pub kind: ChangeKind,
    pub pod: PodRecord,
}

/// One census over the matched pod set: how many pods are currently
/// restarting out of how many exist. Computed fresh for every admission
/// decision and never reused across decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CensusSnapshot {
    pub restarting: usize,
    pub total: usize,
}

impl CensusSnapshot {
    /// The snapshot returned when the fleet could not be listed.
    ///
    /// Callers must treat this as "unknown", not as an empty fleet known
    /// with certainty; the watch loop refuses to admit against it.
    pub fn unknown() -> Self {
        Self {
            restarting: 0,
            total: 0,
        }
    }
}
