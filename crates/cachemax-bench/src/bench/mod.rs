//! I/O strategies, the runner that times them, and the comparison scenarios.

mod mapped;
mod memory;
mod runner;
pub mod scenario;
mod sync_io;

pub use mapped::MappedFileStrategy;
pub use memory::DirectMemoryStrategy;
pub use runner::{throughput_mbps, BenchmarkRunner, Phases};
pub use scenario::{Measurement, ScenarioReport, ScenarioRunner};
pub use sync_io::{OpenMode, SyncFileStrategy};

use crate::error::Result;
use serde::Serialize;
use std::time::Duration;

/// Step of a strategy run, reported between timed regions.
#[derive(Debug, Clone, Copy)]
pub struct PhaseProgress {
    /// Step about to start ("prepare", "write", "read", "finalize").
    pub phase_name: &'static str,
    /// Step index (0-based).
    pub phase_index: usize,
    /// Total steps in this run.
    pub total_phases: usize,
}

/// Callback for receiving phase progress updates.
///
/// Never invoked inside a clock bracket.
pub type PhaseProgressCallback<'a> = &'a dyn Fn(PhaseProgress);

/// How the runner drives a strategy's offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPattern {
    /// `operation_count` seeded random offsets per phase.
    Random,
    /// One in-order pass over every block of the range.
    SequentialSweep,
}

/// One way of moving a block between a buffer and the target.
///
/// The runner calls `prepare` once, then the timed write and read phases,
/// then `finalize` exactly once, even if a phase failed.
pub trait IoStrategy {
    /// Report label for this strategy.
    fn label(&self) -> &'static str;

    /// Offset pattern this strategy is measured with.
    fn access_pattern(&self) -> AccessPattern {
        AccessPattern::Random
    }

    /// Byte written by this strategy's write phase.
    fn fill_byte(&self) -> u8;

    /// Acquire resources for a target of `size_bytes`. Untimed.
    fn prepare(&mut self, size_bytes: u64) -> Result<()>;

    /// Copy one block at `offset` into `buf`.
    fn read_block(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Copy `buf` into the block at `offset`.
    fn write_block(&mut self, offset: u64, buf: &[u8]) -> Result<()>;

    /// Durability barrier for everything written so far.
    fn flush(&mut self) -> Result<()>;

    /// Flush outstanding writes and release every handle. Idempotent.
    fn finalize(&mut self) -> Result<()>;
}

/// Measured detail of one timed phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseStats {
    /// Time between the two clock samples.
    pub elapsed: Duration,
    /// Transfers issued, including failed ones.
    pub attempted_ops: u64,
    /// Transfers that failed and were skipped.
    pub failed_ops: u64,
    /// `attempted_ops * block size`.
    pub bytes: u64,
    /// `bytes / MB / elapsed seconds`.
    pub throughput_mbps: f64,
}

/// Outcome of one phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseOutcome {
    /// Completed a clock bracket.
    Measured(PhaseStats),
    /// Skipped or aborted; reported as 0.0.
    NotMeasured {
        /// Why, if the phase was attempted.
        reason: Option<String>,
    },
}

impl PhaseOutcome {
    /// Outcome for a phase that was never attempted.
    pub fn skipped() -> Self {
        Self::NotMeasured { reason: None }
    }

    /// Outcome for a phase that failed before completing its bracket.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::NotMeasured {
            reason: Some(reason.into()),
        }
    }

    /// Throughput in MB/s, or 0.0 if not measured.
    pub fn throughput_mbps(&self) -> f64 {
        match self {
            Self::Measured(stats) => stats.throughput_mbps,
            Self::NotMeasured { .. } => 0.0,
        }
    }

    /// Phase detail, if measured.
    pub fn stats(&self) -> Option<&PhaseStats> {
        match self {
            Self::Measured(stats) => Some(stats),
            Self::NotMeasured { .. } => None,
        }
    }
}

/// Result of one full prepare/write/read/finalize cycle of a strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkResult {
    label: String,
    write: PhaseOutcome,
    read: PhaseOutcome,
}

impl BenchmarkResult {
    /// Create a result.
    pub fn new(label: impl Into<String>, write: PhaseOutcome, read: PhaseOutcome) -> Self {
        Self {
            label: label.into(),
            write,
            read,
        }
    }

    /// Result with neither phase measured.
    pub fn unmeasured(label: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(
            label,
            PhaseOutcome::failed(reason.clone()),
            PhaseOutcome::failed(reason),
        )
    }

    /// Strategy label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Read throughput in MB/s; 0.0 means not measured.
    pub fn read_throughput_mbps(&self) -> f64 {
        self.read.throughput_mbps()
    }

    /// Write throughput in MB/s; 0.0 means not measured.
    pub fn write_throughput_mbps(&self) -> f64 {
        self.write.throughput_mbps()
    }

    /// Read phase outcome.
    pub fn read(&self) -> &PhaseOutcome {
        &self.read
    }

    /// Write phase outcome.
    pub fn write(&self) -> &PhaseOutcome {
        &self.write
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmeasured_reports_zero() {
        let result = BenchmarkResult::unmeasured("x", "open failed");
        assert!(result.read_throughput_mbps().abs() < f64::EPSILON);
        assert!(result.write_throughput_mbps().abs() < f64::EPSILON);
        assert!(result.read().stats().is_none());
    }

    #[test]
    fn test_measured_throughput_exposed() {
        let stats = PhaseStats {
            elapsed: Duration::from_secs(1),
            attempted_ops: 256,
            failed_ops: 0,
            bytes: 1024 * 1024,
            throughput_mbps: 1.0,
        };
        let result = BenchmarkResult::new("x", PhaseOutcome::Measured(stats), PhaseOutcome::skipped());
        assert!((result.write_throughput_mbps() - 1.0).abs() < f64::EPSILON);
        assert!(result.read_throughput_mbps().abs() < f64::EPSILON);
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(PhaseOutcome::skipped()).unwrap();
        assert_eq!(json["status"], "not_measured");
    }
}
