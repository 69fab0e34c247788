// Copyright 2025 Fan-Out Aggregator Contributors
// SPDX-License-Identifier: Apache-2.0

//! Concurrent fan-out over three timed legs.
//!
//! Each leg is an async operation behind the [`Leg`] trait. [`FanOut::run`]
//! polls the three legs concurrently within the caller's task, times each
//! one independently and joins them:
//!
//! ```text
//! request ──┬── db leg ───────┐
//!           ├── api leg ──────┼── join ── AggregatedResult
//!           └── internal leg ─┘
//! ```
//!
//! The join short-circuits on the first failure. The remaining legs are
//! dropped at that point, which cancels their in-flight I/O.
//!
//! # Example
//!
//! ```ignore
//! use fanout_core::{FanOut, LegContext};
//!
//! let fanout = FanOut::new(db_leg, api_leg, internal_leg);
//! let result = fanout.run(&LegContext::new("sqlx rocks")).await?;
//! println!("slowest leg took {} ms", result.benchmark.slowest());
//! ```

use crate::error::{AggregationError, LegError};
use crate::types::{AggregatedResult, BenchmarkRecord, LegName, Millis};
use async_trait::async_trait;
use metrics::{counter, histogram};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Per-request inputs shared by all legs.
#[derive(Debug, Clone, Default)]
pub struct LegContext {
    /// Text forwarded to the internal endpoint.
    pub text: String,
    /// Request id of the inbound request, forwarded on outbound loopback calls.
    pub request_id: Option<String>,
}

impl LegContext {
    /// Create a context carrying `text` and no request id.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            request_id: None,
        }
    }

    /// Attach the inbound request id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// One independently timed operation of a fan-out.
#[async_trait]
pub trait Leg: Send + Sync {
    /// Which leg this is.
    fn name(&self) -> LegName;

    /// Perform the operation and return its JSON output.
    async fn call(&self, ctx: &LegContext) -> Result<serde_json::Value, LegError>;
}

/// A leg output paired with its elapsed time.
#[derive(Debug, Clone)]
pub struct Timed<T> {
    /// The leg output
    pub value: T,
    /// Wall-clock time from just before the call to just after it resolved
    pub elapsed: Millis,
}

/// Run a single leg on its own clock.
///
/// Records `fanout_leg_duration_ms` on success and
/// `fanout_leg_failures_total` on failure, both labelled by leg.
pub async fn timed_leg(
    leg: &dyn Leg,
    ctx: &LegContext,
) -> Result<Timed<serde_json::Value>, AggregationError> {
    let name = leg.name();
    let start = Instant::now();

    match leg.call(ctx).await {
        Ok(value) => {
            let elapsed = Millis::from_duration(start.elapsed());
            histogram!("fanout_leg_duration_ms", "leg" => name.as_str()).record(elapsed.as_f64());
            debug!(leg = %name, elapsed_ms = %elapsed, "Leg completed");
            Ok(Timed { value, elapsed })
        }
        Err(source) => {
            counter!("fanout_leg_failures_total", "leg" => name.as_str()).increment(1);
            warn!(leg = %name, error = %source, "Leg failed");
            Err(AggregationError::Leg { leg: name, source })
        }
    }
}

/// The three legs of a fan-out, ready to be run per request.
#[derive(Clone)]
pub struct FanOut {
    db: Arc<dyn Leg>,
    api: Arc<dyn Leg>,
    internal: Arc<dyn Leg>,
}

impl FanOut {
    /// Assemble a fan-out from its three legs.
    pub fn new(db: Arc<dyn Leg>, api: Arc<dyn Leg>, internal: Arc<dyn Leg>) -> Self {
        Self { db, api, internal }
    }

    /// Launch all three legs concurrently and join them.
    ///
    /// On success the benchmark record holds each leg's own elapsed time.
    /// On the first failure the other legs are dropped and the error is
    /// returned; no partial result is produced.
    pub async fn run(&self, ctx: &LegContext) -> Result<AggregatedResult, AggregationError> {
        let (db, api, internal) = tokio::try_join!(
            timed_leg(self.db.as_ref(), ctx),
            timed_leg(self.api.as_ref(), ctx),
            timed_leg(self.internal.as_ref(), ctx),
        )?;

        let mut benchmark = BenchmarkRecord::default();
        benchmark.set(self.db.name(), db.elapsed);
        benchmark.set(self.api.name(), api.elapsed);
        benchmark.set(self.internal.name(), internal.elapsed);

        Ok(AggregatedResult {
            benchmark,
            db_result: db.value,
            api_result: api.value,
            internal_result: internal.value,
        })
    }
}

impl std::fmt::Debug for FanOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOut")
            .field("db", &self.db.name())
            .field("api", &self.api.name())
            .field("internal", &self.internal.name())
            .finish()
    }
}
