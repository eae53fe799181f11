//! Evidence collection for flagged pods
//!
//! Fetch failures never propagate: they are logged and replaced with a
//! placeholder so diagnosis always receives usable text.

use tracing::{error, instrument};

use super::client::ClusterClient;
use crate::models::Evidence;

/// Fetch the log tail and the full pod record for one incident
#[instrument(skip(client))]
pub async fn collect_evidence(
    client: &dyn ClusterClient,
    namespace: &str,
    name: &str,
    tail_lines: i64,
) -> Evidence {
    let logs = match client.fetch_logs(namespace, name, tail_lines).await {
        Ok(logs) => logs,
        Err(e) => {
            error!(namespace, name, error = %e, "Failed to get pod logs");
            format!("Error reading logs: {}", e)
        }
    };

    let description = match client.fetch_pod(namespace, name).await {
        Ok(pod) => match serde_json::to_string_pretty(&pod) {
            Ok(json) => json,
            Err(e) => {
                error!(namespace, name, error = %e, "Failed to render pod description");
                format!("Error describing pod: {}", e)
            }
        },
        Err(e) => {
            error!(namespace, name, error = %e, "Failed to describe pod");
            format!("Error describing pod: {}", e)
        }
    };

    Evidence::new(logs, description)
}
