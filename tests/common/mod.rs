//! Scripted in-memory cluster shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use k8s_openapi::api::core::v1::{
    ContainerState, ContainerStateWaiting, ContainerStatus, Pod, PodStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::error::ErrorResponse;
use tokio::time::Instant;

use pod_healer::error::{ClusterError, ClusterResult, HealerError, HealerResult};
use pod_healer::k8s::{ClusterClient, ClusterConnector, PodEventStream, RawEvent, WatchEventType};

/// What one `list_and_watch_pods` call should do
pub enum WatchScript {
    /// Yield these items, then end as if the server timeout elapsed
    Events(Vec<ClusterResult<RawEvent>>),
    /// Fail to open the watch
    OpenError(ClusterError),
}

#[derive(Default)]
pub struct ScriptedCluster {
    watches: Mutex<VecDeque<WatchScript>>,
    pub watch_calls: Mutex<Vec<(Instant, Duration)>>,
    pub log_calls: Mutex<Vec<(String, String, i64)>>,
    pub describe_calls: Mutex<Vec<(String, String)>>,
    pub delete_calls: Mutex<Vec<(String, String)>>,
    pods: Mutex<HashMap<(String, String), Pod>>,
    missing_pods: Mutex<HashSet<String>>,
    fail_reads: Mutex<bool>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedCluster {
    pub fn new(scripts: Vec<WatchScript>) -> Arc<Self> {
        Arc::new(Self {
            watches: Mutex::new(scripts.into()),
            ..Default::default()
        })
    }

    /// Register the record returned by `fetch_pod`
    pub fn add_pod(&self, pod: &Pod) {
        let key = (
            pod.metadata.namespace.clone().unwrap_or_default(),
            pod.metadata.name.clone().unwrap_or_default(),
        );
        self.pods.lock().unwrap().insert(key, pod.clone());
    }

    /// Make log and describe calls fail with a transport-style error
    pub fn fail_reads(&self) {
        *self.fail_reads.lock().unwrap() = true;
    }

    /// Deleting this pod reports NotFound
    pub fn mark_missing(&self, name: &str) {
        self.missing_pods.lock().unwrap().insert(name.to_string());
    }

    pub fn watch_count(&self) -> usize {
        self.watch_calls.lock().unwrap().len()
    }

    pub fn deletes(&self) -> Vec<(String, String)> {
        self.delete_calls.lock().unwrap().clone()
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn transport_error() -> ClusterError {
        ClusterError::Kube(kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "connection refused".to_string(),
            reason: "ServiceUnavailable".to_string(),
            code: 503,
        }))
    }
}

#[async_trait]
impl ClusterClient for ScriptedCluster {
    async fn list_and_watch_pods(&self, timeout: Duration) -> ClusterResult<PodEventStream> {
        self.watch_calls.lock().unwrap().push((Instant::now(), timeout));
        let next = self.watches.lock().unwrap().pop_front();
        match next {
            Some(WatchScript::Events(items)) => Ok(futures::stream::iter(items).boxed()),
            Some(WatchScript::OpenError(e)) => Err(e),
            // Script exhausted: park on a watch that never ends
            None => Ok(futures::stream::pending().boxed()),
        }
    }

    async fn fetch_logs(
        &self,
        namespace: &str,
        name: &str,
        tail_lines: i64,
    ) -> ClusterResult<String> {
        self.enter().await;
        self.log_calls
            .lock()
            .unwrap()
            .push((namespace.to_string(), name.to_string(), tail_lines));
        let failing = *self.fail_reads.lock().unwrap();
        self.leave();
        if failing {
            return Err(Self::transport_error());
        }
        Ok(format!("{} starting\nfatal: exiting with code 1", name))
    }

    async fn fetch_pod(&self, namespace: &str, name: &str) -> ClusterResult<Pod> {
        self.enter().await;
        self.describe_calls
            .lock()
            .unwrap()
            .push((namespace.to_string(), name.to_string()));
        let failing = *self.fail_reads.lock().unwrap();
        let found = self
            .pods
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned();
        self.leave();
        if failing {
            return Err(Self::transport_error());
        }
        found.ok_or_else(|| ClusterError::NotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> ClusterResult<()> {
        self.enter().await;
        self.delete_calls
            .lock()
            .unwrap()
            .push((namespace.to_string(), name.to_string()));
        let missing = self.missing_pods.lock().unwrap().contains(name);
        self.leave();
        if missing {
            return Err(ClusterError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

/// Hands out the scripted cluster, optionally failing the first connects
pub struct ScriptedConnector {
    cluster: Arc<ScriptedCluster>,
    failures_left: Mutex<usize>,
    pub connect_calls: Mutex<Vec<Instant>>,
}

impl ScriptedConnector {
    pub fn new(cluster: Arc<ScriptedCluster>, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            cluster,
            failures_left: Mutex::new(failures),
            connect_calls: Mutex::new(Vec::new()),
        })
    }

    pub fn connects(&self) -> Vec<Instant> {
        self.connect_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClusterConnector for ScriptedConnector {
    async fn connect(&self) -> HealerResult<Arc<dyn ClusterClient>> {
        self.connect_calls.lock().unwrap().push(Instant::now());
        let mut left = self.failures_left.lock().unwrap();
        if *left > 0 {
            *left -= 1;
            return Err(HealerError::Connect("no kubeconfig found".to_string()));
        }
        Ok(self.cluster.clone())
    }
}

/// Pod whose primary container waits with `reason` (or is healthy when `None`)
pub fn pod(namespace: &str, name: &str, reason: Option<&str>) -> Pod {
    let state = reason.map(|r| ContainerState {
        waiting: Some(ContainerStateWaiting {
            reason: Some(r.to_string()),
            message: Some(format!("back-off restarting container ({})", r)),
        }),
        ..Default::default()
    });

    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        status: Some(PodStatus {
            phase: Some("Running".to_string()),
            container_statuses: Some(vec![ContainerStatus {
                name: "app".to_string(),
                ready: reason.is_none(),
                state,
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn event(event_type: WatchEventType, pod: Pod) -> ClusterResult<RawEvent> {
    Ok(RawEvent::new(event_type, pod))
}
