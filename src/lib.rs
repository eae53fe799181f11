//! Pod Healer Library
//!
//! Watches pods across the cluster, detects known failure states, diagnoses
//! them and applies a remediation, all inside a supervisor that keeps the
//! watch alive through disconnects and crashes.

pub mod classifier;
pub mod config;
pub mod diagnosis;
pub mod error;
pub mod k8s;
pub mod models;
pub mod remediation;
pub mod supervisor;

use std::sync::Arc;

use crate::config::Config;
use crate::diagnosis::build_engine;
use crate::k8s::KubeConnector;
use crate::supervisor::WatchSupervisor;

/// Create a supervisor wired to the real cluster and the configured engine
pub fn create_supervisor(config: &Config) -> WatchSupervisor {
    WatchSupervisor::new(config, Arc::new(KubeConnector), build_engine(config))
}
