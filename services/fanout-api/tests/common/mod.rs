//! Shared helpers for end-to-end tests.
//!
//! Each test binds the real service to `127.0.0.1:0`, points the remote leg
//! at a local stub and uses an in-memory SQLite pool.

#![allow(dead_code)]

use axum::{
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use fanout_api::{
    config::{AppConfig, DataSourceKind},
    db,
    legs::DataSource,
    Server,
};
use serde_json::{json, Value};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::SqlitePool;
use std::time::Duration;
use tokio::net::TcpListener;

/// Body served by the stub remote API.
pub fn sample_todo() -> Value {
    json!({
        "userId": 1,
        "id": 1,
        "title": "delectus aut autem",
        "completed": false
    })
}

async fn serve_stub(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

/// Stub remote API answering `GET /todos/1` after `delay` with `status`.
pub async fn spawn_remote_stub(delay: Duration, status: StatusCode) -> String {
    let app = Router::new().route(
        "/todos/1",
        get(move || async move {
            tokio::time::sleep(delay).await;
            (status, Json(sample_todo()))
        }),
    );
    format!("{}/todos/1", serve_stub(app).await)
}

/// Stub remote API answering 200 with a body that is not JSON.
pub async fn spawn_garbage_stub() -> String {
    let app = Router::new().route("/todos/1", get(|| async { "<html>not json</html>" }));
    format!("{}/todos/1", serve_stub(app).await)
}

/// Stub `/internal` that reports the request id header it received.
pub async fn spawn_header_echo_stub() -> String {
    let app = Router::new().route(
        "/internal",
        get(|headers: HeaderMap| async move {
            let id = headers
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Json(json!({ "request_id": id }))
        }),
    );
    serve_stub(app).await
}

/// Configuration for a test server talking to `remote_url`.
pub fn test_config(remote_url: String) -> AppConfig {
    let mut config = AppConfig::default();
    config.server.port = 0;
    config.data_source.kind = DataSourceKind::Sqlite;
    config.data_source.url = "sqlite::memory:".to_string();
    config.remote.url = remote_url;
    config.remote.use_system_proxy = false;
    config.internal.delay_ms = 50;
    config.server.static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/public").into();
    config
}

/// Open and seed an in-memory pool.
pub async fn seeded_pool(config: &AppConfig) -> SqlitePool {
    let pool = db::connect(&config.data_source).await.unwrap();
    db::reset_and_seed(&pool).await.unwrap();
    pool
}

/// A running test server.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }

    pub async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let response = self.get(path).await;
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        let body = response.json::<Value>().await.unwrap();
        (status, body)
    }
}

/// Bind and spawn the service.
pub async fn spawn_app(config: &AppConfig, data_source: DataSource) -> TestApp {
    spawn_app_with_metrics(config, data_source, None).await
}

/// Bind and spawn the service, exposing `metrics` on `/metrics`.
pub async fn spawn_app_with_metrics(
    config: &AppConfig,
    data_source: DataSource,
    metrics: Option<PrometheusHandle>,
) -> TestApp {
    let server = Server::bind(config, data_source, metrics).await.unwrap();
    let base_url = format!("http://{}", server.local_addr());
    tokio::spawn(async move {
        server
            .run_until(std::future::pending())
            .await
            .unwrap()
    });

    TestApp {
        base_url,
        client: reqwest::Client::builder().no_proxy().build().unwrap(),
    }
}

/// Spawn the service with a seeded SQLite data source.
pub async fn spawn_seeded_app(config: &AppConfig) -> TestApp {
    let pool = seeded_pool(config).await;
    spawn_app(config, DataSource::Sqlite(pool)).await
}

/// Assert `value` is a non-negative millisecond string with two decimals.
pub fn assert_millis(value: &Value) -> f64 {
    let text = value.as_str().unwrap_or_else(|| panic!("not a string: {value}"));
    let (_, fraction) = text
        .split_once('.')
        .unwrap_or_else(|| panic!("no decimal point: {text}"));
    assert_eq!(fraction.len(), 2, "expected two decimals in {text}");

    let ms: f64 = text.parse().unwrap();
    assert!(ms >= 0.0);
    ms
}
