use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pod_healer::{
    config::{Config, LogFormat},
    create_supervisor,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Read before tracing is up so the format can be chosen
    let (config, warnings) = Config::load()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    for warning in &warnings {
        tracing::warn!("Configuration: {}", warning);
    }

    tracing::info!(
        backend = ?config.diagnosis_backend,
        "Starting Pod Healer"
    );

    let mut supervisor = create_supervisor(&config);
    supervisor.run().await;

    Ok(())
}
