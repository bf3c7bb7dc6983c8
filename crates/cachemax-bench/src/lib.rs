//! Random small-block I/O throughput harness for caching and zero-copy
//! storage layers.
//!
//! Three interchangeable strategies move 4 KiB blocks over the same seeded
//! random workload:
//!
//! - **Synchronous**: one positioned read or write system call per block
//! - **Memory-mapped**: plain copies against a full-file mapping (zero-copy
//!   on DAX volumes)
//! - **Direct memory**: a heap buffer swept sequentially, as a best-case
//!   copy-bandwidth reference
//!
//! The runner brackets each phase with two clock samples and reports MB/s.
//! The analyzer derives speedup and efficiency ratios from those numbers.
//!
//! # Usage
//!
//! ```text
//! cmbench volumes <REGULAR_DIR> <ACCELERATED_DIR>
//! cmbench cache <ORIGINAL> <DIRECT_CACHE> [LAYERED]
//!
//! Options:
//!       --range-mib <MIB>      Addressed range (default: 32)
//!       --block-size <BYTES>   Transfer size (default: 4096)
//!       --operations <N>       Operations per phase (default: 1000)
//!       --seed <SEED>          Workload seed (default: 42, or CMBENCH_SEED)
//!       --time-seed            Seed from the wall clock
//!       --json <PATH>          Export results to JSON
//!       --keep-files           Keep temporary test files
//!   -v, --verbose              Verbose output
//! ```

pub mod bench;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod results;
pub mod workload;

pub use bench::{
    BenchmarkResult, BenchmarkRunner, DirectMemoryStrategy, IoStrategy, MappedFileStrategy,
    OpenMode, Phases, ScenarioReport, ScenarioRunner, SyncFileStrategy,
};
pub use cli::Cli;
pub use clock::Clock;
pub use config::{BenchConfig, Scenario, SeedSource};
pub use error::{BenchError, Result};
pub use workload::{OffsetGenerator, WorkloadSpec};
