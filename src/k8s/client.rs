//! Cluster client seam for the healer
//!
//! `ClusterClient` is the only surface the watch loop uses to talk to the
//! orchestration API. `KubeClusterClient` backs it with kube-rs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, DeleteParams, LogParams, WatchParams},
    config::KubeConfigOptions,
    Client, Config,
};
use tracing::{info, instrument, warn};

use super::watcher::{into_raw_event, RawEvent};
use crate::config::MAX_WATCH_TIMEOUT_SECS;
use crate::error::{ClusterError, ClusterResult, HealerError, HealerResult};

/// Finite stream of pod events produced by one watch call
pub type PodEventStream = BoxStream<'static, ClusterResult<RawEvent>>;

/// Operations the healer needs from the cluster
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// List current pods in all namespaces and watch for changes until the
    /// server-side timeout elapses or the connection drops
    async fn list_and_watch_pods(&self, timeout: Duration) -> ClusterResult<PodEventStream>;

    /// Last `tail_lines` lines of the pod's log
    async fn fetch_logs(&self, namespace: &str, name: &str, tail_lines: i64)
        -> ClusterResult<String>;

    /// Full current pod record, including status
    async fn fetch_pod(&self, namespace: &str, name: &str) -> ClusterResult<Pod>;

    /// Delete the pod; a missing pod yields `ClusterError::NotFound`
    async fn delete_pod(&self, namespace: &str, name: &str) -> ClusterResult<()>;
}

/// kube-rs implementation of `ClusterClient`
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Resolve credentials: in-cluster service account first, then the local kubeconfig
    #[instrument(skip_all)]
    pub async fn connect() -> HealerResult<Self> {
        let config = match Config::incluster() {
            Ok(config) => config,
            Err(e) => {
                info!(reason = %e, "Not running in-cluster, loading local kube config");
                Config::from_kubeconfig(&KubeConfigOptions::default())
                    .await
                    .map_err(|e| HealerError::Connect(e.to_string()))?
            }
        };

        let client = Client::try_from(config).map_err(|e| HealerError::Connect(e.to_string()))?;
        let healer = Self::new(client);
        healer.health_check().await?;
        Ok(healer)
    }

    /// Check if cluster is reachable
    pub async fn health_check(&self) -> HealerResult<()> {
        let version = self
            .client
            .apiserver_version()
            .await
            .map_err(|e| HealerError::Connect(e.to_string()))?;
        info!(version = %version.git_version, "Connected to Kubernetes cluster");
        Ok(())
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    #[instrument(skip(self))]
    async fn list_and_watch_pods(&self, timeout: Duration) -> ClusterResult<PodEventStream> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        let timeout_secs = u32::try_from(timeout.as_secs())
            .unwrap_or(MAX_WATCH_TIMEOUT_SECS)
            .clamp(1, MAX_WATCH_TIMEOUT_SECS);
        let params = WatchParams::default().timeout(timeout_secs);

        // Resource version "0": the server replays current state as ADDED events first.
        let stream = pods.watch(&params, "0").await?;

        Ok(stream
            .filter_map(|event| futures::future::ready(into_raw_event(event)))
            .boxed())
    }

    #[instrument(skip(self))]
    async fn fetch_logs(
        &self,
        namespace: &str,
        name: &str,
        tail_lines: i64,
    ) -> ClusterResult<String> {
        let params = LogParams {
            tail_lines: Some(tail_lines),
            ..Default::default()
        };
        self.pods(namespace)
            .logs(name, &params)
            .await
            .map_err(|e| ClusterError::from_kube(e, namespace, name))
    }

    #[instrument(skip(self))]
    async fn fetch_pod(&self, namespace: &str, name: &str) -> ClusterResult<Pod> {
        self.pods(namespace)
            .get(name)
            .await
            .map_err(|e| ClusterError::from_kube(e, namespace, name))
    }

    #[instrument(skip(self))]
    async fn delete_pod(&self, namespace: &str, name: &str) -> ClusterResult<()> {
        match self.pods(namespace).delete(name, &DeleteParams::default()).await {
            Ok(_) => {
                info!(namespace, name, "Deleted pod");
                Ok(())
            }
            Err(e) => {
                let err = ClusterError::from_kube(e, namespace, name);
                if !err.is_not_found() {
                    warn!(namespace, name, error = %err, "Pod deletion failed");
                }
                Err(err)
            }
        }
    }
}

/// Acquires a cluster client when the supervisor (re)starts
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    async fn connect(&self) -> HealerResult<Arc<dyn ClusterClient>>;
}

/// Default connector: in-cluster identity, falling back to the local kubeconfig
#[derive(Clone, Default)]
pub struct KubeConnector;

#[async_trait]
impl ClusterConnector for KubeConnector {
    async fn connect(&self) -> HealerResult<Arc<dyn ClusterClient>> {
        let client = KubeClusterClient::connect().await?;
        Ok(Arc::new(client))
    }
}
