//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `TRIALFLOW` prefix and
//! nested values are separated by double underscores. Every section has
//! defaults, so an empty environment yields a runnable configuration.
//!
//! # Example
//!
//! ```no_run
//! use trialflow::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Ticking every {:?}", config.engine.tick_interval());
//! ```

mod commission;
mod delivery;
mod engine;
mod error;
mod lifecycle;
mod scoring;
mod storage;
mod telemetry;

pub use commission::CommissionConfig;
pub use delivery::DeliveryConfig;
pub use engine::EngineConfig;
pub use error::{ConfigError, ValidationError};
pub use lifecycle::LifecycleConfig;
pub use scoring::{ScoringConfig, ThresholdsConfig, WeightsConfig};
pub use storage::StorageConfig;
pub use telemetry::TelemetryConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Tick cadence and worker pool
    #[serde(default)]
    pub engine: EngineConfig,

    /// Trial length, expiring window, consultant delay, retention
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Risk factor weights, thresholds and signal strengths
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Partner commission rates
    #[serde(default)]
    pub commission: CommissionConfig,

    /// Retry policy, send timeout and webhook endpoint
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Optional data directory for the file repositories
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log level and format
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `TRIALFLOW` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `TRIALFLOW__ENGINE__WORKER_POOL_SIZE=16` -> `engine.worker_pool_size = 16`
    /// - `TRIALFLOW__SCORING__WEIGHTS__COMPANY_TIER=35` -> `scoring.weights.company_tier = 35`
    /// - `TRIALFLOW__SCORING__RECOGNIZED_ENTERPRISES=Contoso,Initech` -> list
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TRIALFLOW")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("scoring.recognized_enterprises"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Builds every domain policy once so that inconsistent weights,
    /// thresholds, rates or lifecycle durations fail at startup.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.engine.validate()?;
        self.lifecycle.settings()?;
        self.scoring.policy()?;
        self.commission.rates()?;
        self.delivery.validate()?;
        Ok(())
    }
}
