// Copyright 2025 Fan-Out Aggregator Contributors
// SPDX-License-Identifier: Apache-2.0

//! Request id middleware for the Fan-Out API.
//!
//! Reads `x-request-id` from the inbound request, or mints a UUID v4 when it
//! is absent or unusable, injects a [`RequestId`] into the request extensions
//! and echoes the id on the response. The internal leg forwards the same
//! header, so the loopback `/internal` call logs under its caller's id.

use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use tracing::debug;
use uuid::Uuid;

/// Header carrying the request id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Longest inbound id accepted as-is.
pub const MAX_REQUEST_ID_LEN: usize = 128;

/// Identifier of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_acceptable(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN && id.bytes().all(|b| b.is_ascii_graphic())
}

/// Middleware function that assigns every request an id.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let inbound = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|s| is_acceptable(s))
        .map(|s| s.to_string());

    let id = match inbound {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            debug!(request_id = %id, "No usable inbound request id, generated one");
            id
        }
    };

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}

/// Extracts the [`RequestId`] set by [`request_id_middleware`].
///
/// Falls back to a fresh id when the middleware is not installed, so
/// handlers never have to reject for a missing id.
#[async_trait::async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| RequestId(Uuid::new_v4().to_string())))
    }
}
