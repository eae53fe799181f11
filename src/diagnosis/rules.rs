//! Default rule-table diagnosis
//!
//! Deterministic substring matching over the evidence text. First matching
//! rule wins.

use async_trait::async_trait;

use super::DiagnosisEngine;
use crate::error::DiagnosisError;
use crate::models::{Diagnosis, RemediationDirective};

/// A substring that, when present in the evidence, selects a diagnosis
#[derive(Debug, Clone)]
pub struct DiagnosisRule {
    pub needle: String,
    pub explanation: String,
    pub directive: RemediationDirective,
}

impl DiagnosisRule {
    pub fn new(needle: &str, explanation: &str, directive: RemediationDirective) -> Self {
        Self {
            needle: needle.to_string(),
            explanation: explanation.to_string(),
            directive,
        }
    }

    fn matches(&self, evidence: &str) -> bool {
        evidence.contains(&self.needle)
    }
}

#[derive(Debug, Clone)]
pub struct RuleBasedEngine {
    rules: Vec<DiagnosisRule>,
}

impl RuleBasedEngine {
    pub fn new(rules: Vec<DiagnosisRule>) -> Self {
        Self { rules }
    }

    /// Synchronous lookup; same text always gives the same diagnosis
    pub fn evaluate(&self, evidence: &str) -> Diagnosis {
        self.rules
            .iter()
            .find(|rule| rule.matches(evidence))
            .map(|rule| Diagnosis::new(rule.explanation.clone(), rule.directive))
            .unwrap_or_else(Diagnosis::unknown)
    }
}

impl Default for RuleBasedEngine {
    fn default() -> Self {
        Self::new(vec![
            DiagnosisRule::new(
                "CrashLoopBackOff",
                "Pod is crashing due to a misconfigured env var or missing dependency.",
                RemediationDirective::DeletePod,
            ),
            DiagnosisRule::new(
                "ImagePullBackOff",
                "The image may be misnamed or the registry is not accessible. Check image name or credentials.",
                RemediationDirective::ManualImageCheck,
            ),
        ])
    }
}

#[async_trait]
impl DiagnosisEngine for RuleBasedEngine {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn try_diagnose(&self, evidence: &str) -> Result<Diagnosis, DiagnosisError> {
        Ok(self.evaluate(evidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crash_loop_rule() {
        let engine = RuleBasedEngine::default();
        let diagnosis = engine.evaluate("Describe:\n\"reason\": \"CrashLoopBackOff\"");
        assert_eq!(diagnosis.directive, RemediationDirective::DeletePod);
        assert!(diagnosis.explanation.contains("misconfigured env var"));
    }

    #[test]
    fn test_image_pull_rule() {
        let engine = RuleBasedEngine::default();
        let diagnosis = engine.evaluate("waiting: ImagePullBackOff");
        assert_eq!(diagnosis.directive, RemediationDirective::ManualImageCheck);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let engine = RuleBasedEngine::default();
        let diagnosis = engine.evaluate("ImagePullBackOff then CrashLoopBackOff");
        assert_eq!(diagnosis.directive, RemediationDirective::DeletePod);
    }

    #[test]
    fn test_unmatched_evidence_is_unknown() {
        let engine = RuleBasedEngine::default();
        assert_eq!(engine.evaluate("all good"), Diagnosis::unknown());
        assert_eq!(engine.evaluate(""), Diagnosis::unknown());
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let engine = RuleBasedEngine::default();
        let text = "Logs:\nerror\n\nDescribe:\nCrashLoopBackOff";
        assert_eq!(engine.evaluate(text), engine.evaluate(text));
    }

    #[test]
    fn test_custom_rules() {
        let engine = RuleBasedEngine::new(vec![DiagnosisRule::new(
            "OOMKilled",
            "Container exceeded its memory limit.",
            RemediationDirective::DeletePod,
        )]);
        assert_eq!(
            engine.evaluate("lastState: OOMKilled").directive,
            RemediationDirective::DeletePod
        );
        assert_eq!(
            engine.evaluate("CrashLoopBackOff").directive,
            RemediationDirective::NoAction
        );
    }
}
