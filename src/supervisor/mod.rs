//! Watch supervisor
//!
//! Owns the watch subscription and drives every event through the incident
//! pipeline. State machine:
//!
//! ```text
//! Starting -> Watching <-> Processing
//!                |
//!                v
//!           Reconnecting -> Watching ...
//! any fatal error or panic -> Crashed -> Starting
//! ```
//!
//! The watch is retried forever with a fixed delay and the whole machine is
//! restarted after a longer delay, so `run` never returns.

mod pipeline;
mod state;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::{FutureExt, StreamExt};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::diagnosis::DiagnosisEngine;
use crate::error::{ClusterResult, HealerError};
use crate::k8s::{ClusterClient, ClusterConnector};

pub use pipeline::{EventOutcome, IncidentPipeline};
pub use state::{SupervisorState, SupervisorStats};

pub struct WatchSupervisor {
    connector: Arc<dyn ClusterConnector>,
    pipeline: IncidentPipeline,
    watch_timeout: Duration,
    reconnect_delay: Duration,
    restart_delay: Duration,
    state: SupervisorState,
    stats: SupervisorStats,
}

impl WatchSupervisor {
    pub fn new(
        config: &Config,
        connector: Arc<dyn ClusterConnector>,
        engine: Box<dyn DiagnosisEngine>,
    ) -> Self {
        Self {
            connector,
            pipeline: IncidentPipeline::new(engine, config.log_tail_lines),
            watch_timeout: config.watch_timeout(),
            reconnect_delay: config.reconnect_delay(),
            restart_delay: config.restart_delay(),
            state: SupervisorState::Starting,
            stats: SupervisorStats::default(),
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn stats(&self) -> &SupervisorStats {
        &self.stats
    }

    /// Run forever: every attempt that ends is followed by a restart delay
    pub async fn run(&mut self) {
        info!(
            watch_timeout_secs = self.watch_timeout.as_secs(),
            reconnect_delay_secs = self.reconnect_delay.as_secs(),
            restart_delay_secs = self.restart_delay.as_secs(),
            "Starting pod healer supervisor"
        );

        loop {
            let failure = match AssertUnwindSafe(self.run_attempt()).catch_unwind().await {
                Ok(err) => err,
                Err(panic) => HealerError::Panic(panic_message(panic.as_ref())),
            };

            self.transition(SupervisorState::Crashed);
            self.stats.restarts += 1;
            error!(
                error = %failure,
                restart_in_secs = self.restart_delay.as_secs(),
                "Healer crashed, restarting"
            );
            tokio::time::sleep(self.restart_delay).await;
        }
    }

    /// One pass from Starting; only returns with the error that ended it
    async fn run_attempt(&mut self) -> HealerError {
        self.transition(SupervisorState::Starting);
        let client = match self.connector.connect().await {
            Ok(client) => client,
            Err(e) => return e,
        };

        loop {
            self.transition(SupervisorState::Watching);
            match self.watch_once(client.as_ref()).await {
                Ok(events) => info!(events, "Watch stream ended"),
                Err(e) => error!(error = %e, "Watch loop error"),
            }

            self.transition(SupervisorState::Reconnecting);
            self.stats.reconnects += 1;
            info!(
                delay_secs = self.reconnect_delay.as_secs(),
                stats = ?self.stats,
                "Reconnecting watch"
            );
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    /// Consume one watch call to its end, processing events in delivery order
    async fn watch_once(&mut self, client: &dyn ClusterClient) -> ClusterResult<u64> {
        let mut stream = client.list_and_watch_pods(self.watch_timeout).await?;
        let mut events = 0u64;

        while let Some(item) = stream.next().await {
            let event = item?;
            events += 1;

            self.transition(SupervisorState::Processing);
            let outcome = self.pipeline.process_event(client, &event).await;
            self.stats.record(&outcome);
            self.transition(SupervisorState::Watching);

            debug!("Waiting for next event...");
        }

        Ok(events)
    }

    fn transition(&mut self, next: SupervisorState) {
        if SupervisorState::is_per_event(self.state, next) {
            debug!(from = %self.state, to = %next, "Supervisor transition");
        } else if next == SupervisorState::Crashed {
            warn!(from = %self.state, to = %next, "Supervisor transition");
        } else {
            info!(from = %self.state, to = %next, "Supervisor transition");
        }
        self.state = next;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
