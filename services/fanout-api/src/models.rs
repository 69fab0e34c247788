// Copyright 2025 Fan-Out Aggregator Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared application state.

use crate::config::{AppConfig, InternalVariant};
use crate::legs::{http_client, DataSource, DatabaseLeg, InternalLeg, RemoteApiLeg};
use fanout_core::FanOut;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;

/// Behaviour of the `/internal` endpoint.
#[derive(Debug, Clone)]
pub struct InternalSettings {
    pub variant: InternalVariant,
    pub delay: Duration,
}

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// The three legs run by `/concurrent`
    pub fanout: FanOut,
    /// Text sent to `/internal` when the caller supplies none
    pub probe_text: String,
    pub internal: InternalSettings,
    /// Prometheus handle, present when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the legs from configuration.
    ///
    /// `internal_base_url` is where this server can reach itself; it is
    /// ignored when `internal.base_url` is configured.
    pub fn new(
        config: &AppConfig,
        data_source: DataSource,
        internal_base_url: &str,
    ) -> reqwest::Result<Self> {
        let timeout = config.remote.timeout_ms.map(Duration::from_millis);
        let remote_client = http_client(timeout, config.remote.use_system_proxy)?;
        let loopback_client = http_client(timeout, false)?;
        let base_url = config
            .internal
            .base_url
            .as_deref()
            .unwrap_or(internal_base_url);

        let fanout = FanOut::new(
            Arc::new(DatabaseLeg::new(data_source)),
            Arc::new(RemoteApiLeg::new(remote_client, config.remote.url.clone())),
            Arc::new(InternalLeg::new(loopback_client, base_url)),
        );

        Ok(Self {
            fanout,
            probe_text: config.internal.probe_text.clone(),
            internal: InternalSettings {
                variant: config.internal.variant,
                delay: config.internal.delay(),
            },
            metrics: None,
        })
    }

    /// Expose `handle` on `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
