// src/main.rs
use anyhow::{Context, Result};
use health_monitor::{
    config::load_config,
    health::HttpProber,
    metrics::MetricsRegistry,
    notify::create_notifier,
    runner::{RunController, ServiceSource},
    store::create_store,
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("health_monitor=info".parse()?),
        )
        .init();

    // Load configuration; anything missing here aborts before a single probe
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "health-monitor.yaml".to_string());

    info!("Loading configuration from: {}", config_path);
    let config = load_config(&config_path)?;

    let store = create_store(&config.store)?;
    let prober = Arc::new(HttpProber::new(config.probe.clone())?);
    let notifier = create_notifier(&config.notifier).context("Failed to create notifier")?;
    let metrics_registry = MetricsRegistry::new()?;

    let source = if config.services.is_empty() {
        ServiceSource::Store
    } else {
        ServiceSource::Static(config.services.clone())
    };

    let controller = RunController::new(store, prober, notifier)
        .with_policy(config.persistence_policy)
        .with_source(source)
        .with_metrics(metrics_registry.collector());

    let report = controller
        .run()
        .await
        .context("Failed to load the service list")?;

    info!("Run finished: {}", report);

    if let Some(path) = &config.metrics.textfile_path {
        match metrics_registry.write_textfile(path) {
            Ok(()) => info!("Metrics written to {}", path.display()),
            Err(e) => error!("Failed to write metrics: {:#}", e),
        }
    }

    Ok(())
}
