//! Remediation executor
//!
//! Turns a directive into a cluster mutation (or a documented skip). Cluster
//! failures never escape; they become `RemediationOutcome::Failed`.

use tracing::{info, instrument, warn};

use crate::k8s::ClusterClient;
use crate::models::{RemediationDirective, RemediationOutcome};

pub const MANUAL_IMAGE_CHECK: &str = "requires manual image/registry check";
pub const NO_FIX_RULE: &str = "no fix rule matched";

#[derive(Debug, Clone, Copy, Default)]
pub struct RemediationExecutor;

impl RemediationExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Apply `directive` to the pod `namespace/name`
    #[instrument(skip(self, client))]
    pub async fn apply(
        &self,
        namespace: &str,
        name: &str,
        directive: RemediationDirective,
        client: &dyn ClusterClient,
    ) -> RemediationOutcome {
        match directive {
            RemediationDirective::DeletePod => match client.delete_pod(namespace, name).await {
                Ok(()) => RemediationOutcome::Applied(format!(
                    "Deleted pod {} in namespace {}",
                    name, namespace
                )),
                Err(e) if e.is_not_found() => {
                    info!(namespace, name, "Pod already gone, nothing to delete");
                    RemediationOutcome::Applied(format!(
                        "Pod {} in namespace {} already deleted",
                        name, namespace
                    ))
                }
                Err(e) => {
                    warn!(namespace, name, error = %e, "Failed to apply fix");
                    RemediationOutcome::Failed(format!("Fix error: {}", e))
                }
            },
            RemediationDirective::ManualImageCheck => {
                RemediationOutcome::Skipped(MANUAL_IMAGE_CHECK.to_string())
            }
            RemediationDirective::NoAction => RemediationOutcome::Skipped(NO_FIX_RULE.to_string()),
        }
    }
}
