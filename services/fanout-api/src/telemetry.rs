// Copyright 2025 Fan-Out Aggregator Contributors
// SPDX-License-Identifier: Apache-2.0

//! Logging and metrics setup for the binary.

use crate::config::LogFormat;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

/// How often recorded histogram samples are folded into their summaries.
pub const METRICS_UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug,sqlx=warn";

/// Install the global tracing subscriber.
pub fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
    }
}

/// Install the global Prometheus recorder and return a handle for `/metrics`.
///
/// Can only succeed once per process. Pair with [`spawn_metrics_upkeep`], or
/// samples pile up until the next scrape.
pub fn install_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Periodically drain pending samples held by `handle`.
pub fn spawn_metrics_upkeep(handle: PrometheusHandle, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            handle.run_upkeep();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_upkeep_keeps_running_and_preserves_samples() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            for ms in [3.0, 7.0, 11.0] {
                metrics::histogram!("fanout_leg_duration_ms", "leg" => "db").record(ms);
            }
        });

        let upkeep = spawn_metrics_upkeep(handle.clone(), Duration::from_millis(100));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(!upkeep.is_finished());
        let rendered = handle.render();
        assert!(rendered.contains("fanout_leg_duration_ms_count{leg=\"db\"} 3"), "{rendered}");

        upkeep.abort();
    }
}
