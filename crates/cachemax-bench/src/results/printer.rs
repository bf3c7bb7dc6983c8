//! Human-readable report printer.

use crate::bench::{Measurement, PhaseOutcome, ScenarioReport};
use crate::results::analysis::{Analysis, Band, Comparison, RatioKind};
use crate::results::format::{format_bytes, format_duration, format_mbps, format_percentage};
use crate::workload::WorkloadSpec;
use owo_colors::OwoColorize;

/// Formats and prints scenario reports.
pub struct ReportPrinter {
    /// Whether color output is enabled.
    color: bool,
}

impl ReportPrinter {
    /// Create a new printer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn heading(&self, text: &str) {
        if self.color {
            println!("{}", text.bold());
        } else {
            println!("{text}");
        }
    }

    /// Print the workload parameters.
    ///
    /// ```text
    /// cmbench volumes: 32 MiB range, 4 KiB blocks, 1000 ops/phase, seed 42
    /// ```
    pub fn print_header(&self, scenario: &str, workload: &WorkloadSpec) {
        let params = format!(
            "{} range, {} blocks, {} ops/phase, seed {}",
            format_bytes(workload.total_range_bytes),
            format_bytes(workload.block_size_bytes),
            workload.operation_count,
            workload.seed
        );
        if self.color {
            println!("{} {}: {}", "cmbench".bold(), scenario.cyan(), params.dimmed());
        } else {
            println!("cmbench {scenario}: {params}");
        }
        println!();
    }

    /// Print the full report: measurements, then analysis.
    pub fn print_report(&self, report: &ScenarioReport) {
        self.print_measurements(&report.measurements);
        self.print_analysis(&report.analysis);
    }

    /// Print one block per measurement.
    ///
    /// ```text
    /// accelerated / Memory Mapped (Zero-Copy 4K Random)
    ///   Read:  1843.21 MB/s    (1000 ops in 2.12 ms)
    ///   Write: 902.77 MB/s     (1000 ops in 4.33 ms)
    /// ```
    pub fn print_measurements(&self, measurements: &[Measurement]) {
        self.heading("Results");
        for m in measurements {
            let name = format!("{} / {}", m.target, m.result.label());
            if self.color {
                println!("  {}", name.cyan());
            } else {
                println!("  {name}");
            }
            self.print_phase("Read: ", m.result.read());
            self.print_phase("Write:", m.result.write());
        }
        println!();
    }

    fn print_phase(&self, name: &str, outcome: &PhaseOutcome) {
        match outcome {
            PhaseOutcome::Measured(stats) => {
                let mut detail = format!(
                    "({} ops in {})",
                    stats.attempted_ops,
                    format_duration(stats.elapsed)
                );
                if stats.failed_ops > 0 {
                    detail.push_str(&format!(", {} failed", stats.failed_ops));
                }
                let value = format_mbps(stats.throughput_mbps);
                if self.color {
                    println!("    {} {:<16} {}", name.bold(), value.green(), detail.dimmed());
                } else {
                    println!("    {name} {value:<16} {detail}");
                }
            }
            PhaseOutcome::NotMeasured { reason } => {
                let reason = reason.as_deref().unwrap_or("skipped");
                if self.color {
                    println!("    {} {} ({})", name.bold(), "not measured".yellow(), reason.dimmed());
                } else {
                    println!("    {name} not measured ({reason})");
                }
            }
        }
    }

    /// Print comparisons grouped by heading, then the zero-copy verdict.
    ///
    /// ```text
    /// Caching layer vs direct cache access
    ///   caching layer read: 85.3% of direct cache    [excellent]
    /// ```
    pub fn print_analysis(&self, analysis: &Analysis) {
        self.heading("Analysis");

        let mut last_title = None;
        for comparison in &analysis.comparisons {
            if last_title != Some(comparison.title) {
                println!("  {}", comparison.title);
                last_title = Some(comparison.title);
            }
            self.print_comparison(comparison);
        }

        if let Some(check) = &analysis.zero_copy {
            println!("  Zero-copy read throughput ({})", check.target);
            let value = format_mbps(check.read_mbps);
            match check.band {
                Some(band) => println!("    {}    [{}]", value, self.band(band)),
                None => println!("    {value}"),
            }
        }
        println!();
    }

    fn print_comparison(&self, c: &Comparison) {
        match c.kind {
            RatioKind::Speedup => {
                let ratio = c.ratio.to_string();
                let ratio = if self.color {
                    ratio.cyan().to_string()
                } else {
                    ratio
                };
                println!("    {} {}: {} vs {}", c.candidate, c.metric, ratio, c.baseline);
            }
            RatioKind::Efficiency => {
                let pct = format_percentage(c.ratio);
                let band = c
                    .band
                    .map(|b| format!("    [{}]", self.band(b)))
                    .unwrap_or_default();
                println!("    {} {}: {} of {}{}", c.candidate, c.metric, pct, c.baseline, band);
            }
        }
    }

    fn band(&self, band: Band) -> String {
        let text = band.to_string();
        if !self.color {
            return text;
        }
        match band {
            Band::Excellent => text.green().bold().to_string(),
            Band::Good => text.yellow().to_string(),
            Band::NeedsWork => text.red().to_string(),
        }
    }
}
