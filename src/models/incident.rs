//! Per-incident records: evidence, diagnosis and remediation outcome

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;
use uuid::Uuid;

use super::pod::FailureSignature;

/// Log tail and pod description gathered for one incident.
/// Always fetched fresh; never cached between incidents.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Evidence {
    pub logs: String,
    pub description: String,
}

impl Evidence {
    pub fn new(logs: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            logs: logs.into(),
            description: description.into(),
        }
    }

    /// Text handed to the diagnosis engine
    pub fn to_prompt(&self) -> String {
        format!("Logs:\n{}\n\nDescribe:\n{}", self.logs, self.description)
    }
}

/// Remediation chosen by a diagnosis
#[derive(Debug, Clone, Copy, Serialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RemediationDirective {
    DeletePod,
    ManualImageCheck,
    NoAction,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Diagnosis {
    pub explanation: String,
    pub directive: RemediationDirective,
}

impl Diagnosis {
    pub fn new(explanation: impl Into<String>, directive: RemediationDirective) -> Self {
        Self {
            explanation: explanation.into(),
            directive,
        }
    }

    /// Neutral result used when a backend fails
    pub fn engine_error() -> Self {
        Self::new("engine error", RemediationDirective::NoAction)
    }

    pub fn unknown() -> Self {
        Self::new("Unknown issue", RemediationDirective::NoAction)
    }
}

/// Result of executing a directive
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RemediationOutcome {
    Applied(String),
    Skipped(String),
    Failed(String),
}

impl RemediationOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            RemediationOutcome::Applied(_) => "applied",
            RemediationOutcome::Skipped(_) => "skipped",
            RemediationOutcome::Failed(_) => "failed",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            RemediationOutcome::Applied(d)
            | RemediationOutcome::Skipped(d)
            | RemediationOutcome::Failed(d) => d,
        }
    }
}

impl std::fmt::Display for RemediationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind(), self.detail())
    }
}

/// Everything produced while handling one flagged pod
#[derive(Debug, Clone, Serialize)]
pub struct IncidentReport {
    pub id: Uuid,
    pub detected_at: DateTime<Utc>,
    pub namespace: String,
    pub name: String,
    pub signature: FailureSignature,
    pub evidence: Evidence,
    pub diagnosis: Diagnosis,
    pub outcome: RemediationOutcome,
}

impl IncidentReport {
    /// Single-line JSON rendering for the audit log
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
