//! Markdown output generation for benchmark results.

use crate::result::BenchmarkResult;
use crate::summarize;
use fanout_core::LegName;
use std::fmt::Write;

/// Make `text` safe to place inside a table cell.
fn table_cell(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace('|', "\\|")
}

/// Generate a markdown summary from benchmark results.
pub fn generate_summary(results: &[BenchmarkResult]) -> String {
    let summary = summarize(results);
    let mut output = String::new();

    writeln!(output, "# Fan-Out Benchmark Summary").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Generated: {}", chrono::Utc::now().to_rfc3339()).unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "Iterations: {} ({} failed)",
        summary.iterations, summary.failures
    )
    .unwrap();
    writeln!(output).unwrap();

    writeln!(output, "## Legs (ms)").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "| Leg | Min | Mean | P50 | Max | Samples |").unwrap();
    writeln!(output, "|-----|-----|------|-----|-----|---------|").unwrap();
    for leg in LegName::ALL {
        let stats = summary.legs.get(&leg).copied().unwrap_or_default();
        writeln!(
            output,
            "| {} | {} | {} | {} | {} | {} |",
            leg.label(),
            stats.min,
            stats.mean,
            stats.p50,
            stats.max,
            stats.samples
        )
        .unwrap();
    }
    writeln!(output).unwrap();

    writeln!(output, "## Concurrency").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "- Mean wall time: {} ms", summary.mean_wall).unwrap();
    writeln!(output, "- Mean slowest leg: {} ms", summary.mean_slowest).unwrap();
    writeln!(output, "- Mean sum of legs: {} ms", summary.mean_sum).unwrap();
    if let Some(ratio) = summary.concurrency_ratio() {
        writeln!(output, "- Wall / sum: {:.2}", ratio).unwrap();
    }

    let failures: Vec<_> = results.iter().filter(|r| !r.is_success()).collect();
    if !failures.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "## Failures").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "| Iteration | Timestamp | Error |").unwrap();
        writeln!(output, "|-----------|-----------|-------|").unwrap();
        for result in failures {
            writeln!(
                output,
                "| {} | {} | {} |",
                result.iteration,
                result.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                table_cell(result.error.as_deref().unwrap_or("unknown"))
            )
            .unwrap();
        }
    }

    output
}
