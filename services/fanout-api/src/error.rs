// Copyright 2025 Fan-Out Aggregator Contributors
// SPDX-License-Identifier: Apache-2.0

//! Service error types.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fanout_core::AggregationError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Generic failure indicator returned in the `error` field.
pub const GENERIC_FAILURE: &str = "Something went wrong";

/// Errors surfaced by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// One of the fan-out legs failed
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let details = match &self {
            ApiError::Aggregation(err) => {
                error!(leg = %err.leg(), error = %err, "Fan-out failed");
                err.details()
            }
        };

        let body = Json(json!({
            "error": GENERIC_FAILURE,
            "details": details,
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Errors that stop the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration could not be loaded or is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The data source could not be opened or seeded
    #[error("Data source initialization failed: {0}")]
    DataSource(#[from] sqlx::Error),

    /// The outbound HTTP client could not be built
    #[error("HTTP client initialization failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Binding or serving failed
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
