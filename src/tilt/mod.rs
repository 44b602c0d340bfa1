mod client;
mod status;

pub use client::TiltClient;
pub use status::{aggregate_status, target_status, Status};

use serde::{Deserialize, Serialize};

/// Snapshot of a Tilt session (`tilt.dev/v1alpha1` Session object)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Absent until Tilt has reported anything for the session
    #[serde(default)]
    pub status: Option<SessionStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// Process ID of the Tilt instance
    #[serde(default)]
    pub pid: i64,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub targets: Vec<Target>,
    /// Set once Tilt has stopped (e.g. `tilt ci` finished)
    #[serde(default)]
    pub done: bool,
}

impl Session {
    /// Targets in the order Tilt reported them
    pub fn targets(&self) -> &[Target] {
        self.status
            .as_ref()
            .map(|s| s.targets.as_slice())
            .unwrap_or(&[])
    }
}

/// A single unit of work Tilt tracks, e.g. `api:update` or `api:runtime`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub name: String,
    /// Resources (manifests) this target belongs to
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(rename = "type", default)]
    pub target_type: TargetType,
    #[serde(default)]
    pub state: TargetState,
}

impl Target {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Resource a rebuild of this target should be requested for
    pub fn trigger_resource(&self) -> Option<&str> {
        self.resources.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    /// Image build or apply
    Update,
    /// Long-running process
    Server,
    /// Process expected to run to completion
    Job,
    #[default]
    #[serde(other)]
    Unknown,
}

/// At most one of the fields is expected to be set by Tilt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetState {
    #[serde(default)]
    pub waiting: Option<TargetStateWaiting>,
    #[serde(default)]
    pub active: Option<TargetStateActive>,
    #[serde(default)]
    pub terminated: Option<TargetStateTerminated>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetStateWaiting {
    #[serde(default)]
    pub wait_reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetStateActive {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub ready: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetStateTerminated {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub finish_time: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
