// Copyright 2025 Fan-Out Aggregator Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fan-Out API service.
//!
//! Serves `GET /concurrent`, which queries the data source, calls a remote
//! JSON API and calls this server's own `GET /internal` concurrently, then
//! returns the three results with per-leg timings. Also serves `/health`,
//! `/metrics` and the static benchmark page.

pub mod config;
pub mod db;
pub mod error;
pub mod legs;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod telemetry;

use axum::{body::Body, http::Request, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{info, info_span};

use crate::config::AppConfig;
use crate::error::StartupError;
use crate::legs::{loopback_base_url, DataSource};
use crate::middleware::{request_id_middleware, RequestId};
use crate::models::AppState;

/// Build the full router: API routes, static files, tracing and request ids.
pub fn build_router(state: Arc<AppState>, static_dir: impl AsRef<Path>) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .map(|id| id.as_str())
            .unwrap_or("-");
        info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    Router::new()
        .merge(routes::routes())
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(trace)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// A bound, ready-to-run server.
pub struct Server {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
}

impl Server {
    /// Bind the listener, then wire the legs against the bound address.
    ///
    /// Binding first lets the internal leg target the real port even when
    /// the configured port is `0`.
    pub async fn bind(
        config: &AppConfig,
        data_source: DataSource,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self, StartupError> {
        let listener =
            TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
        let local_addr = listener.local_addr()?;

        let mut state = AppState::new(config, data_source, &loopback_base_url(local_addr))?;
        if let Some(handle) = metrics {
            state = state.with_metrics(handle);
        }

        let router = build_router(Arc::new(state), &config.server.static_dir);
        Ok(Self {
            listener,
            router,
            local_addr,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Server running on http://{}", self.local_addr);
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("Server stopped");
        Ok(())
    }
}
