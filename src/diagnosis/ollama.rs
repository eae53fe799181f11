//! Ollama-backed diagnosis
//!
//! Sends the evidence as a prompt to an Ollama `/api/generate` endpoint and
//! derives the directive from phrases in the model's answer.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::DiagnosisEngine;
use crate::error::DiagnosisError;
use crate::models::{Diagnosis, RemediationDirective};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Clone)]
pub struct OllamaEngine {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaEngine {
    pub fn new(base_url: &str, model: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

/// Pick a directive from the model's free-text answer
pub(crate) fn directive_from_output(output: &str) -> RemediationDirective {
    let output = output.to_lowercase();
    if output.contains("delete the pod") {
        RemediationDirective::DeletePod
    } else if output.contains("check image") {
        RemediationDirective::ManualImageCheck
    } else {
        RemediationDirective::NoAction
    }
}

#[async_trait]
impl DiagnosisEngine for OllamaEngine {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn try_diagnose(&self, evidence: &str) -> Result<Diagnosis, DiagnosisError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: evidence,
            stream: false,
        };

        let response = self
            .http
            .post(self.generate_url())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DiagnosisError::BadStatus(response.status().as_u16()));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| DiagnosisError::InvalidResponse(e.to_string()))?;
        debug!(model = %self.model, output = %body.response, "Model response");

        if body.response.trim().is_empty() {
            return Err(DiagnosisError::InvalidResponse(
                "empty model output".to_string(),
            ));
        }

        let directive = directive_from_output(&body.response);
        info!(model = %self.model, %directive, "Model diagnosis received");
        Ok(Diagnosis::new(body.response, directive))
    }
}
