// Copyright 2025 Fan-Out Aggregator Contributors
// SPDX-License-Identifier: Apache-2.0

//! The three legs of `/concurrent`.
//!
//! - [`DatabaseLeg`] reads the items table, or sleeps and returns a constant
//!   when the data source is simulated
//! - [`RemoteApiLeg`] fetches the configured third-party JSON endpoint
//! - [`InternalLeg`] calls this server's own `/internal` over loopback

use crate::config::{DataSourceConfig, DataSourceKind};
use crate::db;
use crate::middleware::X_REQUEST_ID;
use async_trait::async_trait;
use fanout_core::{Leg, LegContext, LegError, LegName};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use sqlx::SqlitePool;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

/// Value returned by the simulated data source.
pub const SIMULATED_DB_RESULT: &str = "Simulated DB result";

/// Backend of the query leg.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Pooled SQLite connections
    Sqlite(SqlitePool),
    /// Fixed artificial delay, no storage I/O
    Simulated { delay: Duration },
}

impl DataSource {
    /// Open and seed the configured backend.
    pub async fn from_config(config: &DataSourceConfig) -> Result<Self, sqlx::Error> {
        match config.kind {
            DataSourceKind::Sqlite => {
                let pool = db::connect(config).await?;
                db::reset_and_seed(&pool).await?;
                Ok(Self::Sqlite(pool))
            }
            DataSourceKind::Simulated => Ok(Self::Simulated {
                delay: config.simulated_delay(),
            }),
        }
    }
}

/// Query leg: reads all records from the data source.
#[derive(Debug, Clone)]
pub struct DatabaseLeg {
    source: DataSource,
}

impl DatabaseLeg {
    pub fn new(source: DataSource) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Leg for DatabaseLeg {
    fn name(&self) -> LegName {
        LegName::Db
    }

    async fn call(&self, _ctx: &LegContext) -> Result<Value, LegError> {
        match &self.source {
            DataSource::Sqlite(pool) => {
                let items = db::fetch_items(pool)
                    .await
                    .map_err(|e| LegError::DataSource(e.to_string()))?;
                serde_json::to_value(items).map_err(|e| LegError::Decode(e.to_string()))
            }
            DataSource::Simulated { delay } => {
                tokio::time::sleep(*delay).await;
                Ok(Value::String(SIMULATED_DB_RESULT.to_string()))
            }
        }
    }
}

/// Remote-call leg: GET a fixed external URL and parse its JSON body.
#[derive(Debug, Clone)]
pub struct RemoteApiLeg {
    client: Client,
    url: String,
}

impl RemoteApiLeg {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Leg for RemoteApiLeg {
    fn name(&self) -> LegName {
        LegName::Api
    }

    async fn call(&self, _ctx: &LegContext) -> Result<Value, LegError> {
        get_json(self.client.get(&self.url), &self.url).await
    }
}

/// Internal-call leg: GET the sibling `/internal` endpoint over loopback.
#[derive(Debug, Clone)]
pub struct InternalLeg {
    client: Client,
    url: String,
}

impl InternalLeg {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3000`.
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}/internal", base_url.trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Leg for InternalLeg {
    fn name(&self) -> LegName {
        LegName::Internal
    }

    async fn call(&self, ctx: &LegContext) -> Result<Value, LegError> {
        let mut request = self.client.get(&self.url).query(&[("text", ctx.text.as_str())]);
        if let Some(id) = &ctx.request_id {
            request = request.header(X_REQUEST_ID, id);
        }
        get_json(request, &self.url).await
    }
}

async fn get_json(request: RequestBuilder, url: &str) -> Result<Value, LegError> {
    let response = request
        .send()
        .await
        .map_err(|e| LegError::Http(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LegError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.json::<Value>().await.map_err(|e| {
        if e.is_decode() {
            LegError::Decode(e.to_string())
        } else {
            LegError::Http(e.to_string())
        }
    })
}

/// Build an outbound HTTP client.
///
/// Loopback traffic to `/internal` should pass `use_proxy = false`.
pub fn http_client(timeout: Option<Duration>, use_proxy: bool) -> reqwest::Result<Client> {
    let mut builder = Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    if !use_proxy {
        builder = builder.no_proxy();
    }
    builder.build()
}

/// Base URL for reaching a server bound to `addr` from the same host.
///
/// Wildcard binds are reached through the matching loopback address.
pub fn loopback_base_url(addr: SocketAddr) -> String {
    let ip = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    format!("http://{}", SocketAddr::new(ip, addr.port()))
}
