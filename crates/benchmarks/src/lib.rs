//! Repeated-run benchmarks for the Fan-Out Aggregator.
//!
//! A benchmark run calls `/concurrent` several times, keeps one
//! [`BenchmarkResult`] per call and reduces them to a [`BenchmarkSummary`]:
//! per-leg statistics plus the mean wall time, the mean slowest leg and the
//! mean sum of legs. A concurrent fan-out keeps the wall time close to the
//! slowest leg; a sequential one pays the sum.
//!
//! # Quick Start
//!
//! ```no_run
//! use fanout_benchmarks::{io, summarize, BenchmarkResult, ReportFormat};
//! use fanout_core::{BenchmarkRecord, Millis};
//!
//! let results = vec![BenchmarkResult::success(
//!     1,
//!     Millis::from_f64(210.0),
//!     BenchmarkRecord::default(),
//! )];
//!
//! let summary = summarize(&results);
//! println!("mean wall: {} ms", summary.mean_wall);
//! io::write_all_outputs("benchmarks/output", &results, ReportFormat::Both)?;
//! # Ok::<(), fanout_benchmarks::io::ReportError>(())
//! ```
//!
//! # Modules
//!
//! - [`result`] - The per-iteration `BenchmarkResult` struct
//! - [`io`] - Writing and reading results
//! - [`markdown`] - Markdown report generation

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod io;
pub mod markdown;
pub mod result;

pub use io::ReportFormat;
pub use result::BenchmarkResult;

use fanout_core::{LegName, Millis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Distribution of one leg's durations across iterations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LegStats {
    /// Fastest observed duration
    pub min: Millis,
    /// Mean duration
    pub mean: Millis,
    /// Median duration
    pub p50: Millis,
    /// Slowest observed duration
    pub max: Millis,
    /// Number of samples
    pub samples: usize,
}

impl LegStats {
    /// Build statistics from raw samples. Empty input yields all zeros.
    pub fn from_samples(samples: &[Millis]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.as_f64().total_cmp(&b.as_f64()));

        let n = sorted.len();
        Self {
            min: sorted[0],
            mean: mean(&sorted),
            p50: sorted[n / 2],
            max: sorted[n - 1],
            samples: n,
        }
    }
}

/// Aggregate view over a benchmark run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    /// Total iterations attempted
    pub iterations: usize,
    /// Iterations that failed
    pub failures: usize,
    /// Statistics per leg, over successful iterations
    pub legs: BTreeMap<LegName, LegStats>,
    /// Mean client-side wall time of successful iterations
    pub mean_wall: Millis,
    /// Mean of the slowest leg per successful iteration
    pub mean_slowest: Millis,
    /// Mean of the sum of legs per successful iteration
    pub mean_sum: Millis,
}

impl BenchmarkSummary {
    /// Mean wall time as a fraction of the mean sequential cost.
    ///
    /// Close to `slowest / sum` for a concurrent fan-out, close to 1.0 for a
    /// sequential one. `None` when there were no successful iterations.
    pub fn concurrency_ratio(&self) -> Option<f64> {
        let sum = self.mean_sum.as_f64();
        (sum > 0.0).then(|| self.mean_wall.as_f64() / sum)
    }
}

/// Reduce per-iteration results to a summary.
pub fn summarize(results: &[BenchmarkResult]) -> BenchmarkSummary {
    let records: Vec<_> = results
        .iter()
        .filter_map(|r| r.benchmark.map(|b| (r.wall, b)))
        .collect();

    let legs = LegName::ALL
        .iter()
        .map(|leg| {
            let samples: Vec<Millis> = records.iter().map(|(_, b)| b.get(*leg)).collect();
            (*leg, LegStats::from_samples(&samples))
        })
        .collect();

    let walls: Vec<Millis> = records.iter().map(|(wall, _)| *wall).collect();
    let slowest: Vec<Millis> = records.iter().map(|(_, b)| b.slowest()).collect();
    let sums: Vec<Millis> = records.iter().map(|(_, b)| b.sum()).collect();

    BenchmarkSummary {
        iterations: results.len(),
        failures: results.len() - records.len(),
        legs,
        mean_wall: mean(&walls),
        mean_slowest: mean(&slowest),
        mean_sum: mean(&sums),
    }
}

fn mean(samples: &[Millis]) -> Millis {
    if samples.is_empty() {
        return Millis::default();
    }
    let total: f64 = samples.iter().map(|m| m.as_f64()).sum();
    Millis::from_f64(total / samples.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanout_core::BenchmarkRecord;

    fn record(db: f64, api: f64, internal: f64) -> BenchmarkRecord {
        BenchmarkRecord {
            db: Millis::from_f64(db),
            api: Millis::from_f64(api),
            internal: Millis::from_f64(internal),
        }
    }

    #[test]
    fn test_leg_stats_from_samples() {
        let samples: Vec<Millis> = [30.0, 10.0, 20.0].into_iter().map(Millis::from_f64).collect();
        let stats = LegStats::from_samples(&samples);

        assert_eq!(stats.min.as_f64(), 10.0);
        assert_eq!(stats.p50.as_f64(), 20.0);
        assert_eq!(stats.max.as_f64(), 30.0);
        assert_eq!(stats.mean.as_f64(), 20.0);
        assert_eq!(stats.samples, 3);
    }

    #[test]
    fn test_leg_stats_empty() {
        assert_eq!(LegStats::from_samples(&[]), LegStats::default());
    }

    #[test]
    fn test_summarize_skips_failures() {
        let results = vec![
            BenchmarkResult::success(1, Millis::from_f64(310.0), record(5.0, 300.0, 60.0)),
            BenchmarkResult::failure(2, Millis::from_f64(12.0), "Unexpected status 502"),
            BenchmarkResult::success(3, Millis::from_f64(210.0), record(7.0, 200.0, 55.0)),
        ];

        let summary = summarize(&results);
        assert_eq!(summary.iterations, 3);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.legs.len(), 3);
        assert_eq!(summary.legs[&LegName::Api].samples, 2);
        assert_eq!(summary.legs[&LegName::Api].max.as_f64(), 300.0);
        assert_eq!(summary.mean_wall.as_f64(), 260.0);
        assert_eq!(summary.mean_slowest.as_f64(), 250.0);
        assert_eq!(summary.mean_sum.as_f64(), 313.5);

        let ratio = summary.concurrency_ratio().unwrap();
        assert!(ratio < 1.0);
    }

    #[test]
    fn test_summarize_all_failed() {
        let results = vec![BenchmarkResult::failure(1, Millis::from_f64(3.0), "refused")];
        let summary = summarize(&results);

        assert_eq!(summary.failures, 1);
        assert_eq!(summary.mean_wall, Millis::default());
        assert!(summary.concurrency_ratio().is_none());
    }
}
