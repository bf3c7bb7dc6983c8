//! Configuration types and constants for the benchmark harness.

use crate::workload::WorkloadSpec;
use std::path::PathBuf;

/// One "MB" in reported throughput. Matches the historical reports (MiB).
pub const MB: f64 = 1024.0 * 1024.0;

/// Default addressed range: 32 MiB.
pub const DEFAULT_RANGE_BYTES: u64 = 32 * 1024 * 1024;

/// Default transfer size: 4 KiB.
pub const DEFAULT_BLOCK_SIZE: u64 = 4 * 1024;

/// Default random operations per phase.
pub const DEFAULT_OPERATIONS: u64 = 1000;

/// Default workload seed.
pub const DEFAULT_SEED: u64 = 42;

/// Added to the workload seed for the read phase so reads do not replay the
/// write offsets.
pub const READ_SEED_OFFSET: u64 = 1000;

/// Chunk size for the untimed sequential pre-fill of synchronous targets.
pub const PREFILL_CHUNK: usize = 1024 * 1024;

/// Efficiency above this is "excellent".
pub const EFFICIENCY_EXCELLENT: f64 = 0.8;

/// Efficiency above this is "good".
pub const EFFICIENCY_GOOD: f64 = 0.5;

/// Mapped read throughput (MB/s) above this is "excellent" zero-copy.
pub const ZERO_COPY_EXCELLENT_MBPS: f64 = 500.0;

/// Mapped read throughput (MB/s) above this is "good" zero-copy.
pub const ZERO_COPY_GOOD_MBPS: f64 = 100.0;

/// Where the workload seed comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedSource {
    /// Fixed seed, reproducible across runs.
    Fixed(u64),
    /// Derived from the wall clock once at startup (live sessions only).
    WallClock,
}

impl SeedSource {
    /// Resolve to a concrete seed.
    pub fn resolve(self) -> u64 {
        match self {
            Self::Fixed(seed) => seed,
            Self::WallClock => {
                let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
                nanos.unsigned_abs()
            }
        }
    }
}

/// Which comparison to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scenario {
    /// Synchronous vs memory-mapped I/O on a regular and an accelerated
    /// volume, plus the in-memory baseline.
    Volumes {
        /// Directory on ordinary storage.
        regular_dir: PathBuf,
        /// Directory on the accelerated (e.g. DAX) volume.
        accelerated_dir: PathBuf,
    },
    /// Random reads of one file through the original store, the direct cache
    /// store, and the mounted caching layer.
    Cache {
        /// File on the original backing store.
        original: PathBuf,
        /// The same file on the cache store, accessed directly.
        direct_cache: PathBuf,
        /// The same file through the mounted caching layer.
        layered: PathBuf,
    },
}

impl Scenario {
    /// Short name for reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Volumes { .. } => "volumes",
            Self::Cache { .. } => "cache",
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Complete benchmark configuration.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Workload parameters; the seed is already resolved.
    pub workload: WorkloadSpec,
    /// How the seed was chosen.
    pub seed_source: SeedSource,
    /// Comparison to run.
    pub scenario: Scenario,
    /// Colored output.
    pub color: bool,
    /// Leave temporary test files in place.
    pub keep_files: bool,
    /// Optional JSON report destination.
    pub json: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_seed_resolves_to_itself() {
        assert_eq!(SeedSource::Fixed(7).resolve(), 7);
    }

    #[test]
    fn test_scenario_names() {
        let volumes = Scenario::Volumes {
            regular_dir: "/a".into(),
            accelerated_dir: "/b".into(),
        };
        assert_eq!(volumes.to_string(), "volumes");
        let cache = Scenario::Cache {
            original: "/a/f".into(),
            direct_cache: "/b/f".into(),
            layered: "/c/f".into(),
        };
        assert_eq!(cache.name(), "cache");
    }
}
