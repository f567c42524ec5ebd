//! Ticker - drives `Orchestrator::run_tick` on a fixed interval.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::domain::trial::TrialError;

use super::handlers::TickResult;
use super::orchestrator::Orchestrator;

pub struct Ticker {
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
}

impl Ticker {
    pub fn new(orchestrator: Arc<Orchestrator>, interval: Duration) -> Self {
        Self {
            orchestrator,
            interval,
        }
    }

    /// Ticks until the shutdown channel flips to `true`.
    ///
    /// A failed tick is logged and the loop carries on; the next tick
    /// re-evaluates everything from persisted state.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_ms = self.interval.as_millis() as u64, "ticker started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("ticker stopped");
                        return;
                    }
                }

                _ = interval.tick() => {
                    if let Err(e) = self.tick_once().await {
                        tracing::error!(error = %e, retryable = e.is_retryable(), "tick failed");
                    }
                }
            }
        }
    }

    /// Runs one tick at the orchestrator's current time.
    pub async fn tick_once(&self) -> Result<TickResult, TrialError> {
        let now = self.orchestrator.now();
        self.orchestrator.run_tick(now).await
    }
}
