use std::time::Duration;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Server-side watch timeouts must stay below this (API server limit)
pub const MAX_WATCH_TIMEOUT_SECS: u32 = 294;

#[derive(Debug, Clone)]
pub struct Config {
    pub watch_timeout_secs: u32,
    pub reconnect_delay_secs: u64,
    pub restart_delay_secs: u64,
    pub log_tail_lines: i64,
    pub diagnosis_backend: DiagnosisBackend,
    pub ollama_url: String,
    pub ollama_model: String,
    pub log_format: LogFormat,
}

/// Which diagnosis engine the supervisor is wired with
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosisBackend {
    #[default]
    Rules,
    Ollama,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_watch_timeout_secs() -> u32 {
    60
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_restart_delay_secs() -> u64 {
    10
}

fn default_log_tail_lines() -> i64 {
    50
}

fn default_ollama_url() -> String {
    "http://ollama:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

/// Read one key; a missing key is silent, a bad value is reported
fn read_key<T: DeserializeOwned>(
    source: &config::Config,
    key: &str,
    default: T,
    warnings: &mut Vec<String>,
) -> T {
    match source.get::<T>(key) {
        Ok(value) => value,
        Err(config::ConfigError::NotFound(_)) => default,
        Err(e) => {
            warnings.push(format!(
                "invalid value for HEALER_{}: {}, using default",
                key.to_uppercase(),
                e
            ));
            default
        }
    }
}

impl Config {
    /// Load from `HEALER_*` environment variables (and `.env` if present).
    ///
    /// Returns the settings plus any warnings; tracing is not up yet when
    /// this runs, so the caller logs them.
    pub fn load() -> Result<(Self, Vec<String>)> {
        dotenvy::dotenv().ok();
        Self::from_env(config::Environment::with_prefix("HEALER"))
    }

    pub fn from_env(env: config::Environment) -> Result<(Self, Vec<String>)> {
        let source = config::Config::builder()
            .add_source(env.try_parsing(true))
            .build()?;
        Ok(Self::from_source(&source))
    }

    /// Invalid keys fall back to their own default; valid keys are kept
    pub fn from_source(source: &config::Config) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let config = Self {
            watch_timeout_secs: read_key(
                source,
                "watch_timeout_secs",
                default_watch_timeout_secs(),
                &mut warnings,
            ),
            reconnect_delay_secs: read_key(
                source,
                "reconnect_delay_secs",
                default_reconnect_delay_secs(),
                &mut warnings,
            ),
            restart_delay_secs: read_key(
                source,
                "restart_delay_secs",
                default_restart_delay_secs(),
                &mut warnings,
            ),
            log_tail_lines: read_key(
                source,
                "log_tail_lines",
                default_log_tail_lines(),
                &mut warnings,
            ),
            diagnosis_backend: read_key(
                source,
                "diagnosis_backend",
                DiagnosisBackend::default(),
                &mut warnings,
            ),
            ollama_url: read_key(source, "ollama_url", default_ollama_url(), &mut warnings),
            ollama_model: read_key(source, "ollama_model", default_ollama_model(), &mut warnings),
            log_format: read_key(source, "log_format", LogFormat::default(), &mut warnings),
        };
        let config = config.normalized(&mut warnings);
        (config, warnings)
    }

    /// Clamp values the API server or the loop cannot accept
    pub fn normalized(mut self, warnings: &mut Vec<String>) -> Self {
        if self.watch_timeout_secs == 0 || self.watch_timeout_secs > MAX_WATCH_TIMEOUT_SECS {
            let clamped = self.watch_timeout_secs.clamp(1, MAX_WATCH_TIMEOUT_SECS);
            warnings.push(format!(
                "HEALER_WATCH_TIMEOUT_SECS={} out of range, clamped to {}",
                self.watch_timeout_secs, clamped
            ));
            self.watch_timeout_secs = clamped;
        }
        if self.log_tail_lines <= 0 {
            warnings.push(format!(
                "HEALER_LOG_TAIL_LINES={} must be positive, using default",
                self.log_tail_lines
            ));
            self.log_tail_lines = default_log_tail_lines();
        }
        self
    }

    pub fn watch_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.watch_timeout_secs))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_timeout_secs: default_watch_timeout_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            restart_delay_secs: default_restart_delay_secs(),
            log_tail_lines: default_log_tail_lines(),
            diagnosis_backend: DiagnosisBackend::default(),
            ollama_url: default_ollama_url(),
            ollama_model: default_ollama_model(),
            log_format: LogFormat::default(),
        }
    }
}
