//! Kubernetes Pod watch events
//!
//! Converts raw kube watch events into the healer's `RawEvent`.

use k8s_openapi::api::core::v1::Pod;
use kube::api::WatchEvent;
use strum::Display;

use crate::error::{ClusterError, ClusterResult};

/// Kind of change the watch reported
#[derive(Debug, Clone, Copy, Display, PartialEq, Eq)]
#[strum(serialize_all = "UPPERCASE")]
pub enum WatchEventType {
    Added,
    Modified,
    Deleted,
}

/// One (event type, pod snapshot) pair from the watch stream
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub event_type: WatchEventType,
    pub pod: Pod,
}

impl RawEvent {
    pub fn new(event_type: WatchEventType, pod: Pod) -> Self {
        Self { event_type, pod }
    }

    pub fn pod_name(&self) -> &str {
        self.pod.metadata.name.as_deref().unwrap_or("unknown")
    }

    pub fn pod_namespace(&self) -> &str {
        self.pod.metadata.namespace.as_deref().unwrap_or("unknown")
    }
}

/// Map a kube watch item; bookmarks are dropped, error events end the watch
pub(crate) fn into_raw_event(
    event: kube::Result<WatchEvent<Pod>>,
) -> Option<ClusterResult<RawEvent>> {
    match event {
        Ok(WatchEvent::Added(pod)) => Some(Ok(RawEvent::new(WatchEventType::Added, pod))),
        Ok(WatchEvent::Modified(pod)) => Some(Ok(RawEvent::new(WatchEventType::Modified, pod))),
        Ok(WatchEvent::Deleted(pod)) => Some(Ok(RawEvent::new(WatchEventType::Deleted, pod))),
        Ok(WatchEvent::Bookmark(_)) => None,
        Ok(WatchEvent::Error(e)) => Some(Err(ClusterError::WatchEvent {
            code: e.code,
            message: e.message,
        })),
        Err(e) => Some(Err(ClusterError::Kube(e))),
    }
}
