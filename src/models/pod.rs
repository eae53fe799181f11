//! Pod observations and failure signatures

use k8s_openapi::api::core::v1::{Pod, PodStatus};
use serde::Serialize;
use strum::Display;

/// What the watch stream told us about a single pod at one point in time
#[derive(Debug, Clone)]
pub struct PodObservation {
    pub namespace: String,
    pub name: String,
    /// Waiting-state reason of the primary (first) container, if any
    pub waiting_reason: Option<String>,
    /// Raw status snapshot as delivered by the watch
    pub status: Option<PodStatus>,
}

impl PodObservation {
    pub fn new(namespace: &str, name: &str, waiting_reason: Option<&str>) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            waiting_reason: waiting_reason.map(str::to_string),
            status: None,
        }
    }
}

impl From<&Pod> for PodObservation {
    fn from(pod: &Pod) -> Self {
        let status = pod.status.clone();

        // Only the first container is inspected; sidecar failures are not detected.
        let waiting_reason = status
            .as_ref()
            .and_then(|s| s.container_statuses.as_ref())
            .and_then(|statuses| statuses.first())
            .and_then(|c| c.state.as_ref())
            .and_then(|state| state.waiting.as_ref())
            .and_then(|waiting| waiting.reason.clone());

        Self {
            namespace: pod.metadata.namespace.clone().unwrap_or_default(),
            name: pod.metadata.name.clone().unwrap_or_default(),
            waiting_reason,
            status,
        }
    }
}

/// Known failure states a pod can be flagged for
#[derive(Debug, Clone, Copy, Serialize, Display, PartialEq, Eq, Hash)]
pub enum FailureSignature {
    #[strum(serialize = "CrashLoopBackOff")]
    #[serde(rename = "CrashLoopBackOff")]
    CrashLoop,
    #[strum(serialize = "ImagePullBackOff")]
    #[serde(rename = "ImagePullBackOff")]
    ImagePullFailure,
    #[strum(serialize = "NotAFailure")]
    #[serde(rename = "NotAFailure")]
    NotAFailure,
}

impl FailureSignature {
    /// Map a container waiting reason onto a signature
    pub fn from_reason(reason: &str) -> Self {
        match reason {
            "CrashLoopBackOff" => FailureSignature::CrashLoop,
            "ImagePullBackOff" => FailureSignature::ImagePullFailure,
            _ => FailureSignature::NotAFailure,
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, FailureSignature::NotAFailure)
    }
}
