// Copyright 2025 Fan-Out Aggregator Contributors
// SPDX-License-Identifier: Apache-2.0

//! Service configuration.
//!
//! Sources, lowest to highest precedence:
//!
//! 1. Built-in defaults
//! 2. `config/fanout.toml`, or the file named by `FANOUT_CONFIG` (optional)
//! 3. Environment variables `FANOUT__<SECTION>__<KEY>`, e.g. `FANOUT__SERVER__PORT=8080`
//!
//! A `.env` file is loaded into the environment by the binary before this runs.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config/fanout.toml";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_FILE_ENV: &str = "FANOUT_CONFIG";

/// Upper bound for the internal endpoint's artificial delay.
pub const MAX_INTERNAL_DELAY_MS: u64 = 5_000;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range or malformed
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Full service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data_source: DataSourceConfig,
    pub remote: RemoteConfig,
    pub internal: InternalConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    /// `0` binds an ephemeral port.
    pub port: u16,
    /// Directory served at `/`, relative to the working directory.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            static_dir: PathBuf::from("public"),
        }
    }
}

/// Which backend the query leg reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    /// SQLite through a connection pool
    Sqlite,
    /// Fixed delay returning a constant string
    Simulated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceConfig {
    pub kind: DataSourceKind,
    pub url: String,
    pub max_connections: u32,
    pub simulated_delay_ms: u64,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            kind: DataSourceKind::Sqlite,
            url: "sqlite://data.db?mode=rwc".to_string(),
            max_connections: 5,
            simulated_delay_ms: 100,
        }
    }
}

impl DataSourceConfig {
    pub fn simulated_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub url: String,
    /// Per-request timeout for outbound HTTP calls. Unset means wait forever.
    pub timeout_ms: Option<u64>,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` for the remote leg.
    pub use_system_proxy: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: "https://jsonplaceholder.typicode.com/todos/1".to_string(),
            timeout_ms: None,
            use_system_proxy: true,
        }
    }
}

/// Reply shape of `GET /internal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InternalVariant {
    /// `{original, transformed, length}`
    Echo,
    /// `{message}`
    Acknowledge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalConfig {
    pub variant: InternalVariant,
    pub delay_ms: u64,
    /// Text the aggregator sends when the caller supplies none.
    pub probe_text: String,
    /// Where the internal leg reaches `/internal`. Derived from the bound address when unset.
    pub base_url: Option<String>,
}

impl Default for InternalConfig {
    fn default() -> Self {
        Self {
            variant: InternalVariant::Echo,
            delay_ms: 50,
            probe_text: "sqlx rocks".to_string(),
            base_url: None,
        }
    }
}

impl InternalConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl AppConfig {
    /// Load from the default sources.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    /// Load with `path` as the (optional) file source.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config: AppConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("FANOUT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.data_source.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "data_source.max_connections must be at least 1".to_string(),
            ));
        }

        if self.internal.delay_ms > MAX_INTERNAL_DELAY_MS {
            return Err(ConfigError::Invalid(format!(
                "internal.delay_ms must be at most {MAX_INTERNAL_DELAY_MS}, got {}",
                self.internal.delay_ms
            )));
        }

        if !is_http_url(&self.remote.url) {
            return Err(ConfigError::Invalid(format!(
                "remote.url must be an http(s) URL, got '{}'",
                self.remote.url
            )));
        }

        if let Some(base) = &self.internal.base_url {
            if !is_http_url(base) {
                return Err(ConfigError::Invalid(format!(
                    "internal.base_url must be an http(s) URL, got '{base}'"
                )));
            }
        }

        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
