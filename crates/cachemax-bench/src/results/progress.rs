//! Per-strategy progress spinner.
//!
//! The spinner is only redrawn from [`StrategyProgress::update`], which the
//! runner calls between phases. There is no background tick thread, so
//! nothing competes with a timed region for the CPU.
//!
//! Example output:
//! ```text
//! Benchmark: accelerated / Memory Mapped (Zero-Copy 4K Random)
//!   ⠙ Phase 2/4: write
//! ```

use crate::bench::{BenchmarkResult, PhaseProgress};
use crate::results::format::format_mbps;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::IsTerminal;

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// How per-strategy progress is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressMode {
    /// Nothing is printed.
    #[default]
    Hidden,
    /// Spinner and summary lines without color.
    Plain,
    /// Spinner and summary lines with color.
    Colored,
}

impl ProgressMode {
    /// Hidden unless stdout is a terminal.
    pub fn detect(color: bool) -> Self {
        Self::for_terminal(std::io::stdout().is_terminal(), color)
    }

    fn for_terminal(interactive: bool, color: bool) -> Self {
        match (interactive, color) {
            (false, _) => Self::Hidden,
            (true, false) => Self::Plain,
            (true, true) => Self::Colored,
        }
    }
}

/// Spinner shown while one strategy runs against one target.
pub struct StrategyProgress {
    progress: ProgressBar,
    mode: ProgressMode,
}

impl StrategyProgress {
    /// Print the benchmark header and start the spinner.
    pub fn new(target: &str, label: &str, mode: ProgressMode) -> Self {
        if mode == ProgressMode::Hidden {
            return Self {
                progress: ProgressBar::hidden(),
                mode,
            };
        }

        let color = mode == ProgressMode::Colored;
        let header = if color {
            format!("{}: {} / {}", "Benchmark".bold(), target.cyan(), label)
        } else {
            format!("Benchmark: {target} / {label}")
        };
        println!("{header}");

        let template = if color {
            "  {spinner:.cyan} {msg}"
        } else {
            "  {spinner} {msg}"
        };
        let style = ProgressStyle::default_spinner()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        let progress = ProgressBar::new_spinner();
        progress.set_style(style);
        progress.set_message("Starting...");

        Self { progress, mode }
    }

    /// Show the step that is about to start.
    pub fn update(&self, step: &PhaseProgress) {
        let msg = format!(
            "Phase {}/{}: {}",
            step.phase_index + 1,
            step.total_phases,
            step.phase_name
        );
        if self.mode == ProgressMode::Colored {
            self.progress.set_message(msg.dimmed().to_string());
        } else {
            self.progress.set_message(msg);
        }
        self.progress.tick();
    }

    /// Clear the spinner and print a one-line summary.
    pub fn finish(self, result: &BenchmarkResult) {
        self.progress.finish_and_clear();
        if self.mode == ProgressMode::Hidden {
            return;
        }
        let line = format!(
            "read {}, write {}",
            format_mbps(result.read_throughput_mbps()),
            format_mbps(result.write_throughput_mbps())
        );
        if self.mode == ProgressMode::Colored {
            println!("  {} {}", "✓".green(), line);
        } else {
            println!("  done: {line}");
        }
        println!();
    }
}
