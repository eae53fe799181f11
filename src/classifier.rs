//! Failure classification
//!
//! Decides from a single observation whether a pod is in one of the known
//! failure states. Only the primary container is considered.

use crate::models::{FailureSignature, PodObservation};

/// Classify an observation. Total: absent status or reason is `NotAFailure`.
pub fn classify(observation: &PodObservation) -> FailureSignature {
    observation
        .waiting_reason
        .as_deref()
        .map(FailureSignature::from_reason)
        .unwrap_or(FailureSignature::NotAFailure)
}
