//! Fan-Out API server entry point.

use anyhow::Context;
use fanout_api::{config::AppConfig, legs::DataSource, telemetry, Server};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    telemetry::init_tracing(config.logging.format);

    let metrics = telemetry::install_metrics_recorder()
        .context("Failed to install Prometheus recorder")?;
    telemetry::spawn_metrics_upkeep(metrics.clone(), telemetry::METRICS_UPKEEP_INTERVAL);

    let data_source = DataSource::from_config(&config.data_source)
        .await
        .context("Failed to initialize data source")?;
    info!(kind = ?config.data_source.kind, "Data source ready");

    let server = Server::bind(&config, data_source, Some(metrics)).await?;
    server.run_until(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
