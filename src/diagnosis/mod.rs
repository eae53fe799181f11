//! Diagnosis engines
//!
//! An engine turns incident evidence text into a `Diagnosis`. Engines never
//! touch the cluster. The rule table is the default backend; the Ollama
//! backend asks a local language model instead.

mod ollama;
mod rules;

use async_trait::async_trait;
use tracing::error;

use crate::config::{Config, DiagnosisBackend};
use crate::error::DiagnosisError;
use crate::models::Diagnosis;

pub use ollama::OllamaEngine;
pub use rules::{DiagnosisRule, RuleBasedEngine};

#[async_trait]
pub trait DiagnosisEngine: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Backend-specific diagnosis, may fail
    async fn try_diagnose(&self, evidence: &str) -> Result<Diagnosis, DiagnosisError>;

    /// Diagnose without ever failing: backend errors map to "engine error" / no action
    async fn diagnose(&self, evidence: &str) -> Diagnosis {
        match self.try_diagnose(evidence).await {
            Ok(diagnosis) => diagnosis,
            Err(e) => {
                error!(engine = self.name(), error = %e, "Diagnosis engine failed");
                Diagnosis::engine_error()
            }
        }
    }
}

/// Build the engine selected by configuration
pub fn build_engine(config: &Config) -> Box<dyn DiagnosisEngine> {
    match config.diagnosis_backend {
        DiagnosisBackend::Rules => Box::new(RuleBasedEngine::default()),
        DiagnosisBackend::Ollama => Box::new(OllamaEngine::new(
            &config.ollama_url,
            &config.ollama_model,
        )),
    }
}
