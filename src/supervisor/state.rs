//! Supervisor states and running counters

use strum::Display;

use super::pipeline::EventOutcome;
use crate::models::RemediationOutcome;

#[derive(Debug, Clone, Copy, Display, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum SupervisorState {
    /// Acquiring cluster credentials
    Starting,
    /// Consuming a watch stream
    Watching,
    /// Handling one event synchronously
    Processing,
    /// Watch ended or failed; backing off before re-watching
    Reconnecting,
    /// An attempt failed fatally; waiting to restart from Starting
    Crashed,
}

impl SupervisorState {
    /// Per-event hops that are too frequent to log at info
    pub fn is_per_event(from: SupervisorState, to: SupervisorState) -> bool {
        matches!(
            (from, to),
            (SupervisorState::Watching, SupervisorState::Processing)
                | (SupervisorState::Processing, SupervisorState::Watching)
        )
    }
}

/// Counters accumulated over the supervisor's lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupervisorStats {
    pub events_seen: u64,
    pub incidents: u64,
    pub applied: u64,
    pub skipped: u64,
    pub failed: u64,
    pub reconnects: u64,
    pub restarts: u64,
}

impl SupervisorStats {
    pub fn record(&mut self, outcome: &EventOutcome) {
        self.events_seen += 1;
        if let EventOutcome::Incident(report) = outcome {
            self.incidents += 1;
            match report.outcome {
                RemediationOutcome::Applied(_) => self.applied += 1,
                RemediationOutcome::Skipped(_) => self.skipped += 1,
                RemediationOutcome::Failed(_) => self.failed += 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Diagnosis, Evidence, FailureSignature, IncidentReport};

    fn incident(outcome: RemediationOutcome) -> EventOutcome {
        EventOutcome::Incident(Box::new(IncidentReport {
            id: uuid::Uuid::new_v4(),
            detected_at: chrono::Utc::now(),
            namespace: "default".to_string(),
            name: "web-0".to_string(),
            signature: FailureSignature::CrashLoop,
            evidence: Evidence::new("", ""),
            diagnosis: Diagnosis::unknown(),
            outcome,
        }))
    }

    #[test]
    fn test_stats_count_outcomes() {
        let mut stats = SupervisorStats::default();
        stats.record(&EventOutcome::Ignored);
        stats.record(&incident(RemediationOutcome::Applied("ok".to_string())));
        stats.record(&incident(RemediationOutcome::Skipped("no".to_string())));
        stats.record(&incident(RemediationOutcome::Failed("err".to_string())));

        assert_eq!(stats.events_seen, 4);
        assert_eq!(stats.incidents, 3);
        assert_eq!((stats.applied, stats.skipped, stats.failed), (1, 1, 1));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SupervisorState::Reconnecting.to_string(), "reconnecting");
        assert!(SupervisorState::is_per_event(
            SupervisorState::Watching,
            SupervisorState::Processing
        ));
        assert!(!SupervisorState::is_per_event(
            SupervisorState::Watching,
            SupervisorState::Reconnecting
        ));
    }
}
