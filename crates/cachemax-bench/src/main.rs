//! cmbench - random 4K I/O throughput harness.

// Use mimalloc for reduced allocation latency (enabled by default).
// Disable with `--no-default-features` if debugging allocator issues.
#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use cachemax_bench::{
    cli::Cli,
    config::{BenchConfig, SeedSource},
    results::{export_json, ProgressMode, ReportPrinter},
    BenchmarkRunner, Clock, ScenarioRunner,
};
use clap::Parser;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log lines go through indicatif so they appear above spinners.
    // Respect RUST_LOG if set, otherwise use default based on verbose flag.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    });

    let indicatif_layer = IndicatifLayer::new();
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(indicatif_layer.get_stderr_writer()),
        )
        .with(indicatif_layer)
        .with(filter)
        .init();

    let config = cli.into_config().context("Failed to create benchmark config")?;

    // Timing is the whole measurement; there is no degraded mode without it.
    let clock = Clock::calibrate().context("Failed to calibrate the high-resolution clock")?;

    print_banner(&config);

    let runner = BenchmarkRunner::new(&clock, config.workload)
        .context("Invalid workload parameters")?;
    let report = ScenarioRunner::new(runner, config.keep_files)
        .with_progress(ProgressMode::detect(config.color))
        .run(&config.scenario);

    let printer = ReportPrinter::new(config.color);
    printer.print_report(&report);

    if let Some(path) = &config.json {
        export_json(&report, &config, path).context("Failed to export JSON")?;
        println!("Results exported to: {}", path.display());
    }

    Ok(())
}

fn print_banner(config: &BenchConfig) {
    let printer = ReportPrinter::new(config.color);
    printer.print_header(config.scenario.name(), &config.workload);
    if config.seed_source == SeedSource::WallClock {
        tracing::warn!(
            "Seeded from the wall clock ({}); results are not reproducible",
            config.workload.seed
        );
    }
}
