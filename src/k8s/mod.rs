//! Kubernetes integration for the healer
//!
//! This module handles all interactions with the cluster:
//! - Listing and watching pods across all namespaces
//! - Fetching logs and pod records as incident evidence
//! - Deleting pods as a remediation

mod client;
mod evidence;
mod watcher;

#[cfg(test)]
pub use client::MockClusterClient;
pub use client::{
    ClusterClient, ClusterConnector, KubeClusterClient, KubeConnector, PodEventStream,
};
pub use evidence::collect_evidence;
pub use watcher::{RawEvent, WatchEventType};
