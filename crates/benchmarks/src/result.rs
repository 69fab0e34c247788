//! Benchmark result types.
//!
//! One [`BenchmarkResult`] is recorded per call to `/concurrent`.

use chrono::{DateTime, Utc};
use fanout_core::{BenchmarkRecord, Millis};
use serde::{Deserialize, Serialize};

/// Outcome of a single benchmark iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Identifier of the iteration, e.g. `concurrent/iteration-3`.
    pub target_id: String,
    /// 1-based iteration number.
    pub iteration: usize,
    /// Client-side wall time of the whole request.
    pub wall: Millis,
    /// Per-leg durations reported by the server, when the call succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<BenchmarkRecord>,
    /// Failure details, when the call did not succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Timestamp when the iteration finished.
    pub timestamp: DateTime<Utc>,
}

impl BenchmarkResult {
    /// Record a successful iteration.
    pub fn success(iteration: usize, wall: Millis, benchmark: BenchmarkRecord) -> Self {
        Self {
            target_id: target_id(iteration),
            iteration,
            wall,
            benchmark: Some(benchmark),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Record a failed iteration.
    pub fn failure(iteration: usize, wall: Millis, error: impl Into<String>) -> Self {
        Self {
            target_id: target_id(iteration),
            iteration,
            wall,
            benchmark: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    /// Whether the iteration produced a benchmark record.
    pub fn is_success(&self) -> bool {
        self.benchmark.is_some()
    }
}

fn target_id(iteration: usize) -> String {
    format!("concurrent/iteration-{iteration}")
}
