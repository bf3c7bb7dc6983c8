//! Results analysis, output, and export.
//!
//! - `analysis` derives speedup and efficiency ratios and their bands
//! - `printer` renders a report for the terminal
//! - `progress` shows a spinner while a strategy runs
//! - `export_json` writes the machine-readable report

pub mod analysis;
pub mod format;
pub mod printer;
pub mod progress;

pub use analysis::{Analysis, Band, Comparison, Ratio};
pub use format::{format_duration, format_mbps, format_percentage};
pub use printer::ReportPrinter;
pub use progress::{ProgressMode, StrategyProgress};

use crate::bench::{Measurement, ScenarioReport};
use crate::config::{BenchConfig, SeedSource};
use crate::workload::WorkloadSpec;
use anyhow::Context;
use serde::Serialize;
use std::path::Path;

/// JSON-serializable benchmark report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport<'a> {
    pub metadata: ReportMetadata,
    pub results: &'a [Measurement],
    pub analysis: &'a Analysis,
}

/// Report metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub timestamp: String,
    pub platform: String,
    pub cmbench_version: String,
    pub scenario: String,
    pub workload: WorkloadSpec,
    /// Whether the seed came from the wall clock rather than configuration.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub wall_clock_seed: bool,
}

impl ReportMetadata {
    fn new(report: &ScenarioReport, config: &BenchConfig) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            platform: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            cmbench_version: env!("CARGO_PKG_VERSION").to_string(),
            scenario: report.scenario.to_string(),
            workload: report.workload,
            wall_clock_seed: config.seed_source == SeedSource::WallClock,
        }
    }
}

/// Serialize a report to pretty JSON.
pub fn to_json(report: &ScenarioReport, config: &BenchConfig) -> anyhow::Result<String> {
    let json = JsonReport {
        metadata: ReportMetadata::new(report, config),
        results: &report.measurements,
        analysis: &report.analysis,
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Export a report to a JSON file.
pub fn export_json(report: &ScenarioReport, config: &BenchConfig, path: &Path) -> anyhow::Result<()> {
    let json = to_json(report, config)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
