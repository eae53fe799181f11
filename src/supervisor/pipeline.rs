//! Per-event incident pipeline
//!
//! classify -> collect evidence -> diagnose -> remediate, run inline for each
//! watch event. Every stage returns a typed value, so nothing here can fail
//! the watch loop.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::classifier::classify;
use crate::diagnosis::DiagnosisEngine;
use crate::k8s::{collect_evidence, ClusterClient, RawEvent, WatchEventType};
use crate::models::{FailureSignature, IncidentReport, PodObservation, RemediationOutcome};
use crate::remediation::RemediationExecutor;

/// What processing one watch event produced
#[derive(Debug, Clone)]
pub enum EventOutcome {
    /// Pod is not in a known failure state
    Ignored,
    /// Pod was flagged and handled end to end
    Incident(Box<IncidentReport>),
}

impl EventOutcome {
    pub fn report(&self) -> Option<&IncidentReport> {
        match self {
            EventOutcome::Incident(report) => Some(report),
            EventOutcome::Ignored => None,
        }
    }
}

pub struct IncidentPipeline {
    engine: Box<dyn DiagnosisEngine>,
    executor: RemediationExecutor,
    log_tail_lines: i64,
}

impl IncidentPipeline {
    pub fn new(engine: Box<dyn DiagnosisEngine>, log_tail_lines: i64) -> Self {
        Self {
            engine,
            executor: RemediationExecutor::new(),
            log_tail_lines,
        }
    }

    /// Handle one watch event to completion before returning
    pub async fn process_event(&self, client: &dyn ClusterClient, event: &RawEvent) -> EventOutcome {
        debug!(
            event_type = %event.event_type,
            pod = event.pod_name(),
            namespace = event.pod_namespace(),
            "Pod event"
        );

        // The final snapshot of a removed pod keeps its last waiting reason
        if event.event_type == WatchEventType::Deleted {
            return EventOutcome::Ignored;
        }

        let observation = PodObservation::from(&event.pod);
        let signature = classify(&observation);
        if !signature.is_failure() {
            return EventOutcome::Ignored;
        }

        let id = Uuid::new_v4();
        let detected_at = Utc::now();
        let span = info_span!(
            "incident",
            incident_id = %id,
            detected_at = %detected_at.to_rfc3339(),
            namespace = %observation.namespace,
            pod = %observation.name,
        );

        self.handle_incident(id, detected_at, client, observation, signature)
            .instrument(span)
            .await
    }

    async fn handle_incident(
        &self,
        id: Uuid,
        detected_at: DateTime<Utc>,
        client: &dyn ClusterClient,
        observation: PodObservation,
        signature: FailureSignature,
    ) -> EventOutcome {
        let PodObservation { namespace, name, .. } = observation;
        warn!(reason = %signature, "Failure detected on pod {} in {}", name, namespace);

        let evidence = collect_evidence(client, &namespace, &name, self.log_tail_lines).await;

        let diagnosis = self.engine.diagnose(&evidence.to_prompt()).await;
        info!(
            engine = self.engine.name(),
            directive = %diagnosis.directive,
            "Diagnosis: {}",
            diagnosis.explanation
        );

        let outcome = self
            .executor
            .apply(&namespace, &name, diagnosis.directive, client)
            .await;
        match &outcome {
            RemediationOutcome::Failed(detail) => error!(outcome = "failed", "{}", detail),
            other => info!(outcome = other.kind(), "{}", other.detail()),
        }

        let report = IncidentReport {
            id,
            detected_at,
            namespace,
            name,
            signature,
            evidence,
            diagnosis,
            outcome,
        };
        match report.to_json() {
            Ok(json) => info!(report = %json, "Incident closed"),
            Err(e) => warn!(error = %e, "Failed to render incident report"),
        }

        EventOutcome::Incident(Box::new(report))
    }
}
