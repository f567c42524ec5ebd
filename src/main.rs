//! `trialflow` - runs the trial tick loop until Ctrl-C.

use std::process::ExitCode;
use std::sync::Arc;

use secrecy::ExposeSecret;
use tokio::sync::watch;

use trialflow::adapters::{
    FileCommissionRepository, FileTrialRepository, IdempotentNotifier,
    InMemoryCommissionRepository, InMemoryDeliveryReceiptStore, InMemoryEventBus,
    InMemoryTrialRepository, SystemClock, TracingNotifier, WebhookConfig, WebhookNotifier,
};
use trialflow::application::{EngineSettings, Orchestrator, OrchestratorPorts, Ticker};
use trialflow::config::AppConfig;
use trialflow::ports::{Clock, CommissionRepository, Notifier, TrialRepository};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("trialflow: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = trialflow::telemetry::init(&config.telemetry) {
        eprintln!("trialflow: {e}");
        return ExitCode::FAILURE;
    }

    let settings = match EngineSettings::from_config(&config) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let ports = match build_ports(&config) {
        Ok(ports) => ports,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialise adapters");
            return ExitCode::FAILURE;
        }
    };

    let orchestrator = Arc::new(Orchestrator::new(ports, settings));
    let ticker = Ticker::new(orchestrator, config.engine.tick_interval());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("shutdown requested"),
            Err(e) => tracing::error!(error = %e, "failed to listen for Ctrl-C"),
        }
        let _ = shutdown_tx.send(true);
    });

    ticker.run(shutdown_rx).await;
    ExitCode::SUCCESS
}

fn build_ports(
    config: &AppConfig,
) -> Result<OrchestratorPorts, trialflow::domain::foundation::DomainError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let (trials, commissions): (Arc<dyn TrialRepository>, Arc<dyn CommissionRepository>) =
        match (config.storage.trials_dir(), config.storage.commissions_dir()) {
            (Some(trials_dir), Some(commissions_dir)) => {
                tracing::info!(path = %trials_dir.display(), "using file storage");
                (
                    Arc::new(FileTrialRepository::new(trials_dir)),
                    Arc::new(FileCommissionRepository::new(commissions_dir)),
                )
            }
            _ => {
                tracing::warn!("no data directory configured; state is kept in memory only");
                (
                    Arc::new(InMemoryTrialRepository::new()),
                    Arc::new(InMemoryCommissionRepository::new()),
                )
            }
        };

    let notifier: Arc<dyn Notifier> = match (
        &config.delivery.webhook_url,
        &config.delivery.webhook_secret,
    ) {
        (Some(url), Some(secret)) => {
            let webhook = WebhookNotifier::new(
                WebhookConfig::new(url.clone(), secret.expose_secret().clone())
                    .with_timeout(config.delivery.send_timeout()),
            )?;
            tracing::info!(url = %url, "delivering notifications by webhook");
            Arc::new(IdempotentNotifier::new(
                webhook,
                Arc::new(InMemoryDeliveryReceiptStore::new()),
                clock.clone(),
            ))
        }
        _ => Arc::new(TracingNotifier::new()),
    };

    Ok(OrchestratorPorts {
        trials,
        commissions,
        notifier,
        clock,
        events: Some(Arc::new(InMemoryEventBus::new())),
    })
}
