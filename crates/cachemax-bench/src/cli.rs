//! Command-line interface for the benchmark harness.

// Allow CLI-specific patterns
#![allow(clippy::struct_excessive_bools)]

use crate::config::{BenchConfig, Scenario, SeedSource, DEFAULT_SEED};
use crate::workload::WorkloadSpec;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Random 4K I/O throughput harness for caching and zero-copy storage layers.
///
/// Measures synchronous positioned I/O, memory-mapped access, and plain
/// memory copies over the same seeded random workload, then reports speedup
/// and efficiency ratios.
#[derive(Parser, Debug)]
#[command(name = "cmbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Size of the addressed range (and of each test file) in MiB.
    #[arg(long, global = true, default_value = "32", value_name = "MIB")]
    pub range_mib: u64,

    /// Transfer size in bytes.
    #[arg(long, global = true, default_value = "4096", value_name = "BYTES")]
    pub block_size: u64,

    /// Random operations per phase.
    #[arg(long, global = true, default_value = "1000", value_name = "N")]
    pub operations: u64,

    /// Workload seed.
    ///
    /// Can also be set via CMBENCH_SEED environment variable.
    #[arg(long, global = true, env = "CMBENCH_SEED", conflicts_with = "time_seed")]
    pub seed: Option<u64>,

    /// Seed from the wall clock instead (results are not reproducible).
    #[arg(long, global = true)]
    pub time_seed: bool,

    /// Export results to JSON file.
    #[arg(long, global = true, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true, conflicts_with = "color")]
    pub no_color: bool,

    /// Force colored output (even when not a TTY).
    #[arg(long, global = true, conflicts_with = "no_color")]
    pub color: bool,

    /// Verbose output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Leave temporary test files in place after the run.
    #[arg(long, global = true)]
    pub keep_files: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare synchronous and memory-mapped I/O on a regular and an
    /// accelerated (e.g. DAX) volume, against a plain memory baseline.
    Volumes {
        /// Directory on ordinary storage.
        #[arg(value_name = "REGULAR_DIR")]
        regular_dir: PathBuf,

        /// Directory on the accelerated volume.
        #[arg(value_name = "ACCELERATED_DIR")]
        accelerated_dir: PathBuf,
    },

    /// Compare random reads of one file on the original store, on the cache
    /// store directly, and through the mounted caching layer.
    Cache {
        /// File on the original backing store.
        #[arg(value_name = "ORIGINAL")]
        original: PathBuf,

        /// The same file on the cache store.
        #[arg(value_name = "DIRECT_CACHE")]
        direct_cache: PathBuf,

        /// The file as seen through the caching layer.
        ///
        /// Defaults to ORIGINAL, for layers mounted over the original path.
        #[arg(value_name = "LAYERED")]
        layered: Option<PathBuf>,
    },
}

impl Cli {
    /// Validate arguments and build the run configuration.
    pub fn into_config(self) -> Result<BenchConfig> {
        let total_range_bytes = self
            .range_mib
            .checked_mul(1024 * 1024)
            .context("--range-mib is too large")?;

        let seed_source = if self.time_seed {
            SeedSource::WallClock
        } else {
            SeedSource::Fixed(self.seed.unwrap_or(DEFAULT_SEED))
        };

        let workload = WorkloadSpec {
            total_range_bytes,
            block_size_bytes: self.block_size,
            operation_count: self.operations,
            seed: seed_source.resolve(),
        };
        workload.validate().context("Invalid workload parameters")?;

        let scenario = match self.command {
            Command::Volumes {
                regular_dir,
                accelerated_dir,
            } => {
                for dir in [&regular_dir, &accelerated_dir] {
                    if !dir.is_dir() {
                        bail!("Not a directory: {}", dir.display());
                    }
                }
                Scenario::Volumes {
                    regular_dir,
                    accelerated_dir,
                }
            }
            Command::Cache {
                original,
                direct_cache,
                layered,
            } => {
                let layered = layered.unwrap_or_else(|| original.clone());
                Scenario::Cache {
                    original,
                    direct_cache,
                    layered,
                }
            }
        };

        // --color forces it on, --no-color forces it off
        let color = self.color || (!self.no_color && supports_color());

        Ok(BenchConfig {
            workload,
            seed_source,
            scenario,
            color,
            keep_files: self.keep_files,
            json: self.json,
        })
    }
}

/// Check if the terminal supports colors.
fn supports_color() -> bool {
    // https://no-color.org/
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    std::io::stdout().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cmbench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().to_str().unwrap();
        let config = parse(&["volumes", a, a, "--no-color"]).into_config().unwrap();

        assert_eq!(config.workload, WorkloadSpec::default());
        assert_eq!(config.seed_source, SeedSource::Fixed(42));
        assert!(!config.color);
        assert!(!config.keep_files);
        assert_eq!(config.scenario.name(), "volumes");
    }

    #[test]
    fn test_cache_layered_defaults_to_original() {
        let config = parse(&["cache", "/data/f.dat", "/cache/f.dat", "--seed", "7"])
            .into_config()
            .unwrap();
        assert_eq!(config.workload.seed, 7);
        match config.scenario {
            Scenario::Cache {
                original, layered, ..
            } => assert_eq!(original, layered),
            Scenario::Volumes { .. } => panic!("expected cache scenario"),
        }
    }

    #[test]
    fn test_rejects_misaligned_block_size() {
        let err = parse(&["cache", "/a", "/b", "--range-mib", "1", "--block-size", "3000"])
            .into_config()
            .unwrap_err();
        assert!(err.to_string().contains("Invalid workload"));
    }

    #[test]
    fn test_rejects_missing_directory() {
        let err = parse(&["volumes", "/nonexistent/cmbench/a", "/nonexistent/cmbench/b"])
            .into_config()
            .unwrap_err();
        assert!(err.to_string().contains("Not a directory"));
    }

    #[test]
    fn test_seed_conflicts_with_time_seed() {
        let args = ["cmbench", "cache", "/a", "/b", "--seed", "1", "--time-seed"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
