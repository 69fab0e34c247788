//! I/O operations for benchmark results.
//!
//! Output layout under the chosen directory:
//!
//! ```text
//! <dir>/raw/iteration-<n>.json   one file per iteration
//! <dir>/all_results.json         every iteration
//! <dir>/summary.md               Markdown report
//! ```

use crate::markdown;
use crate::result::BenchmarkResult;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default output directory path.
pub const OUTPUT_DIR: &str = "benchmarks/output";

/// Raw results subdirectory name.
pub const RAW_DIR: &str = "raw";

/// Combined results file name.
pub const ALL_RESULTS_FILE: &str = "all_results.json";

/// Summary file name.
pub const SUMMARY_FILE: &str = "summary.md";

/// Errors that can occur while writing or reading reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Filesystem failure
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Results could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unknown report format name
    #[error("Unknown report format '{0}' (expected json, markdown or both)")]
    UnknownFormat(String),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Which report files to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Raw and combined JSON only
    Json,
    /// Markdown summary only
    Markdown,
    /// Everything
    Both,
}

impl ReportFormat {
    fn writes_json(self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }

    fn writes_markdown(self) -> bool {
        matches!(self, Self::Markdown | Self::Both)
    }
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            "both" => Ok(Self::Both),
            other => Err(ReportError::UnknownFormat(other.to_string())),
        }
    }
}

fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    fs::write(path, contents).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Ensure `<dir>` and `<dir>/raw` exist.
pub fn ensure_output_dirs(dir: impl AsRef<Path>) -> Result<()> {
    let raw = dir.as_ref().join(RAW_DIR);
    fs::create_dir_all(&raw).map_err(|source| ReportError::Io { path: raw, source })
}

/// Write benchmark results to a JSON file.
pub fn write_results_json(results: &[BenchmarkResult], path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    write_file(path.as_ref(), json)
}

/// Write one iteration to `<dir>/raw/iteration-<n>.json`.
pub fn write_raw_result(dir: impl AsRef<Path>, result: &BenchmarkResult) -> Result<()> {
    let path = dir
        .as_ref()
        .join(RAW_DIR)
        .join(format!("iteration-{}.json", result.iteration));
    let json = serde_json::to_string_pretty(result)?;
    write_file(&path, json)
}

/// Write the Markdown summary to `<dir>/summary.md`.
pub fn write_summary(dir: impl AsRef<Path>, results: &[BenchmarkResult]) -> Result<()> {
    let summary = markdown::generate_summary(results);
    write_file(&dir.as_ref().join(SUMMARY_FILE), summary)
}

/// Write every output selected by `format` under `dir`.
pub fn write_all_outputs(
    dir: impl AsRef<Path>,
    results: &[BenchmarkResult],
    format: ReportFormat,
) -> Result<()> {
    let dir = dir.as_ref();
    ensure_output_dirs(dir)?;

    if format.writes_json() {
        for result in results {
            write_raw_result(dir, result)?;
        }
        write_results_json(results, dir.join(ALL_RESULTS_FILE))?;
    }

    if format.writes_markdown() {
        write_summary(dir, results)?;
    }

    Ok(())
}

/// Read results from a JSON file.
pub fn read_results_json(path: impl AsRef<Path>) -> Result<Vec<BenchmarkResult>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}
