//! CLI for the Fan-Out Aggregator.
//!
//! This crate provides the `fanout` command-line client: a one-shot `run`
//! that prints the same summary as the benchmark page, and a `bench`
//! subcommand that calls `/concurrent` repeatedly and writes reports.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use fanout_benchmarks::{io as report_io, summarize, BenchmarkResult, ReportFormat};
use fanout_core::{AggregatedResult, LegName, Millis};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::fmt::Write;
use std::time::Instant;

/// Fan-Out Aggregator CLI.
#[derive(Parser, Debug)]
#[command(name = "fanout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the fan-out server.
    #[arg(long, global = true, env = "FANOUT_URL", default_value = "http://127.0.0.1:3000")]
    pub url: String,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Call `/concurrent` once and print the per-leg timings and results.
    Run {
        /// Optional text passed through to the internal leg.
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Call `/concurrent` repeatedly and write reports.
    ///
    /// Results are written to:
    /// - <output>/raw/ - One JSON file per iteration
    /// - <output>/all_results.json - Combined JSON file
    /// - <output>/summary.md - Markdown summary
    Bench {
        /// Number of sequential calls.
        #[arg(short = 'n', long, default_value_t = 10)]
        iterations: usize,

        /// Output directory.
        #[arg(short, long, default_value = report_io::OUTPUT_DIR)]
        output: String,

        /// Output format: json, markdown, or both (default: both).
        #[arg(short, long, default_value = "both")]
        format: String,

        /// Print every iteration.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show version and output locations.
    Status {
        /// Show detailed status information.
        #[arg(short, long)]
        detailed: bool,
    },
}

/// Outcome of one call to `/concurrent`.
#[derive(Debug)]
pub enum CallOutcome {
    /// The server returned an aggregated result.
    Success(AggregatedResult),
    /// The server answered with an error status.
    Failed {
        /// HTTP status code
        status: u16,
        /// Message built from the body's `error` and `details` fields
        message: String,
    },
}

/// Call `GET {base_url}/concurrent` and time it on the client side.
pub async fn call_concurrent(
    client: &reqwest::Client,
    base_url: &str,
    text: Option<&str>,
) -> anyhow::Result<(CallOutcome, Millis)> {
    let url = format!("{}/concurrent", base_url.trim_end_matches('/'));
    let mut request = client.get(&url);
    if let Some(text) = text {
        request = request.query(&[("text", text)]);
    }

    let start = Instant::now();
    let response = request
        .send()
        .await
        .with_context(|| format!("Failed to reach {url}"))?;
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .with_context(|| format!("Response from {url} is not JSON"))?;
    let wall = Millis::from_duration(start.elapsed());

    if status.is_success() {
        let result = serde_json::from_value(body).context("Unexpected response shape")?;
        Ok((CallOutcome::Success(result), wall))
    } else {
        Ok((
            CallOutcome::Failed {
                status: status.as_u16(),
                message: failure_message(&body),
            },
            wall,
        ))
    }
}

/// Build a one-line message from an `{error, details}` body.
pub fn failure_message(body: &Value) -> String {
    let error = body["error"].as_str().unwrap_or("Request failed");
    match body["details"].as_str() {
        Some(details) if !details.is_empty() => format!("{error}: {details}"),
        _ => error.to_string(),
    }
}

/// Text summary of a successful fan-out.
pub fn render_summary(result: &AggregatedResult) -> String {
    let mut output = String::new();

    writeln!(output, "Benchmarks (ms):").unwrap();
    for leg in LegName::ALL {
        writeln!(output, "- {}: {}", leg.label(), result.benchmark.get(leg)).unwrap();
    }
    writeln!(output).unwrap();

    let results = serde_json::json!({
        "dbResult": result.db_result,
        "apiResult": result.api_result,
        "internalResult": result.internal_result,
    });
    writeln!(output, "Results:").unwrap();
    write!(
        output,
        "{}",
        serde_json::to_string_pretty(&results).unwrap_or_default()
    )
    .unwrap();

    output
}

/// Run the CLI with already-parsed arguments.
///
/// # Returns
///
/// `Ok(true)` when the command succeeded, `Ok(false)` when the server
/// reported a failure, or an error if the server could not be reached.
pub async fn run(cli: Cli) -> anyhow::Result<bool> {
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Run { text } => {
            println!("⏳ Running concurrent calls against {}...", cli.url);
            let (outcome, wall) = call_concurrent(&client, &cli.url, text.as_deref()).await?;

            match outcome {
                CallOutcome::Success(result) => {
                    println!("{}", format!("✅ Completed in {wall} ms").green());
                    println!("{}", render_summary(&result));
                    Ok(true)
                }
                CallOutcome::Failed { status, message } => {
                    println!("{}", format!("❌ Error ({status}): {message}").red());
                    Ok(false)
                }
            }
        }

        Commands::Bench {
            iterations,
            output,
            format,
            verbose,
        } => {
            let format: ReportFormat = format.parse()?;
            let results = bench(&client, &cli.url, iterations, verbose).await?;

            report_io::write_all_outputs(&output, &results, format)?;

            let summary = summarize(&results);
            println!(
                "Completed {} iterations ({} failed)",
                summary.iterations, summary.failures
            );
            println!(
                "Mean wall {} ms, mean slowest leg {} ms, mean sum of legs {} ms",
                summary.mean_wall, summary.mean_slowest, summary.mean_sum
            );
            println!("Results written to {output}/");
            Ok(summary.failures == 0)
        }

        Commands::Status { detailed } => {
            println!("Fan-Out Aggregator CLI");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Server: {}", cli.url);

            if detailed {
                println!("\nOutput directories:");
                println!("  - {}/", report_io::OUTPUT_DIR);
                println!("  - {}/{}/", report_io::OUTPUT_DIR, report_io::RAW_DIR);
                println!("\nOutput files:");
                println!("  - {}/{}", report_io::OUTPUT_DIR, report_io::SUMMARY_FILE);
                println!("  - {}/{}", report_io::OUTPUT_DIR, report_io::ALL_RESULTS_FILE);
            }

            Ok(true)
        }
    }
}

/// Call `/concurrent` `iterations` times in sequence.
///
/// Failed iterations are recorded, not fatal; an unreachable server is.
pub async fn bench(
    client: &reqwest::Client,
    base_url: &str,
    iterations: usize,
    verbose: bool,
) -> anyhow::Result<Vec<BenchmarkResult>> {
    let progress = ProgressBar::new(iterations as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut results = Vec::with_capacity(iterations);
    for iteration in 1..=iterations {
        let (outcome, wall) = call_concurrent(client, base_url, None).await?;
        let result = match outcome {
            CallOutcome::Success(aggregated) => {
                BenchmarkResult::success(iteration, wall, aggregated.benchmark)
            }
            CallOutcome::Failed { status, message } => {
                tracing::warn!(iteration, status, %message, "Iteration failed");
                BenchmarkResult::failure(iteration, wall, message)
            }
        };

        if verbose {
            progress.println(format!("  - {}: {} ms", result.target_id, result.wall));
        }
        progress.set_message(format!("{wall} ms"));
        progress.inc(1);
        results.push(result);
    }
    progress.finish_and_clear();

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use fanout_core::BenchmarkRecord;
    use serde_json::json;

    fn sample_result() -> AggregatedResult {
        AggregatedResult {
            benchmark: BenchmarkRecord {
                db: Millis::from_f64(3.5),
                api: Millis::from_f64(120.0),
                internal: Millis::from_f64(55.25),
            },
            db_result: json!([{"id": 1, "name": "Crab"}]),
            api_result: json!({"id": 1}),
            internal_result: json!({"message": "hi"}),
        }
    }

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn test_client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    #[test]
    fn test_render_summary() {
        let text = render_summary(&sample_result());
        assert!(text.starts_with("Benchmarks (ms):\n- DB: 3.50\n- API: 120.00\n- Internal: 55.25\n"));
        assert!(text.contains("Results:"));
        assert!(text.contains("\"dbResult\""));
        assert!(text.contains("Crab"));
    }

    #[test]
    fn test_failure_message() {
        let body = json!({"error": "Something went wrong", "details": "Unexpected status 503"});
        assert_eq!(failure_message(&body), "Something went wrong: Unexpected status 503");
        assert_eq!(failure_message(&json!({})), "Request failed");
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["fanout", "bench", "-n", "3", "--format", "json"]).unwrap();
        assert_eq!(cli.url, "http://127.0.0.1:3000");
        match cli.command {
            Commands::Bench {
                iterations, format, ..
            } => {
                assert_eq!(iterations, 3);
                assert_eq!(format, "json");
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["fanout", "run", "--url", "http://h:1", "-t", "hi"]).unwrap();
        assert_eq!(cli.url, "http://h:1");
        assert!(matches!(cli.command, Commands::Run { text: Some(ref t) } if t == "hi"));
    }

    #[tokio::test]
    async fn test_bench_records_successes_and_failures() {
        let ok = spawn_server(
            Router::new().route("/concurrent", get(|| async { Json(sample_result()) })),
        )
        .await;
        let failing = spawn_server(Router::new().route(
            "/concurrent",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Something went wrong", "details": "boom"})),
                )
            }),
        ))
        .await;

        let client = test_client();
        let results = bench(&client, &ok, 2, false).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_success()));
        assert_eq!(results[1].iteration, 2);
        assert_eq!(results[0].benchmark.unwrap().api.as_f64(), 120.0);

        let results = bench(&client, &failing, 1, false).await.unwrap();
        assert!(!results[0].is_success());
        assert_eq!(results[0].error.as_deref(), Some("Something went wrong: boom"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = call_concurrent(&test_client(), &format!("http://{addr}"), None).await;
        assert!(result.is_err());
    }
}
