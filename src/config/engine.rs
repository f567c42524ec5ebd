//! Engine configuration (tick cadence and worker pool)

use serde::Deserialize;
use std::time::Duration;

use super::ValidationError;

const MAX_WORKER_POOL_SIZE: usize = 256;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Accounts evaluated concurrently during a tick
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,

    /// Seconds between ticks when running as a service
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: default_worker_pool_size(),
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

impl EngineConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.worker_pool_size == 0 || self.worker_pool_size > MAX_WORKER_POOL_SIZE {
            return Err(ValidationError::InvalidWorkerPoolSize);
        }
        if self.tick_interval_secs == 0 {
            return Err(ValidationError::InvalidTickInterval);
        }
        Ok(())
    }
}

fn default_worker_pool_size() -> usize {
    8
}

fn default_tick_interval_secs() -> u64 {
    60
}
