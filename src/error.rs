//! Error types for the healer
//!
//! Every component boundary converts failures into one of these, or into a
//! typed outcome, instead of letting them escape the watch loop.

use thiserror::Error;

/// Failures talking to the orchestration API
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Pod does not exist (HTTP 404)
    #[error("pod {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    /// Watch stream delivered an error event (e.g. 410 Gone)
    #[error("watch stream error ({code}): {message}")]
    WatchEvent { code: u16, message: String },

    /// Transport, auth or API error from the kube client
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

/// Failures inside a diagnosis backend
#[derive(Debug, Error)]
pub enum DiagnosisError {
    #[error("diagnosis backend unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("diagnosis backend returned status {0}")]
    BadStatus(u16),

    #[error("invalid diagnosis response: {0}")]
    InvalidResponse(String),
}

/// Top-level errors that abort a supervisor attempt
#[derive(Debug, Error)]
pub enum HealerError {
    /// Credentials or kubeconfig could not be resolved
    #[error("failed to connect to cluster: {0}")]
    Connect(String),

    /// A panic escaped the attempt
    #[error("supervisor attempt panicked: {0}")]
    Panic(String),
}

pub type ClusterResult<T> = Result<T, ClusterError>;
pub type HealerResult<T> = Result<T, HealerError>;

impl ClusterError {
    /// Map a kube error, turning API 404s into `NotFound`
    pub fn from_kube(err: kube::Error, namespace: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(ref resp) if resp.code == 404 => ClusterError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            other => ClusterError::Kube(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound { .. })
    }
}
