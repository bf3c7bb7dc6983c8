//! Benchmark execution runner.

use crate::bench::{
    AccessPattern, BenchmarkResult, IoStrategy, PhaseOutcome, PhaseProgress, PhaseProgressCallback,
    PhaseStats,
};
use crate::clock::Clock;
use crate::config::{MB, READ_SEED_OFFSET};
use crate::error::Result;
use crate::workload::{sequential_offsets, OffsetGenerator, WorkloadSpec};
use std::ops::{Deref, DerefMut};

/// Which timed phases to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phases {
    /// Write phase, then read phase.
    #[default]
    ReadWrite,
    /// Read phase only; the write phase is reported as not measured.
    ReadOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Write,
    Read,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Read => "read",
        }
    }
}

impl Phases {
    /// Step names reported to progress callbacks, in order.
    pub fn steps(self) -> &'static [&'static str] {
        match self {
            Self::ReadWrite => &["prepare", "write", "read", "finalize"],
            Self::ReadOnly => &["prepare", "read", "finalize"],
        }
    }
}

/// Throughput in MB/s for `bytes` moved in `elapsed_secs`.
pub fn throughput_mbps(bytes: u64, elapsed_secs: f64) -> f64 {
    bytes as f64 / MB / elapsed_secs
}

/// Calls `finalize` on drop unless `finish` already did.
struct FinalizeGuard<'a> {
    strategy: &'a mut dyn IoStrategy,
    finished: bool,
}

impl<'a> FinalizeGuard<'a> {
    fn new(strategy: &'a mut dyn IoStrategy) -> Self {
        Self {
            strategy,
            finished: false,
        }
    }

    fn finish(mut self) -> Result<()> {
        self.finished = true;
        self.strategy.finalize()
    }
}

impl<'a> Deref for FinalizeGuard<'a> {
    type Target = dyn IoStrategy + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.strategy
    }
}

impl DerefMut for FinalizeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.strategy
    }
}

impl Drop for FinalizeGuard<'_> {
    fn drop(&mut self) {
        if !self.finished
            && let Err(e) = self.strategy.finalize()
        {
            tracing::warn!("Finalize of {} failed: {}", self.strategy.label(), e);
        }
    }
}

/// Drives strategies through timed write and read phases.
///
/// Each phase is bracketed by exactly two clock samples around the whole batch
/// of transfers. Failures are contained to the phase they occur in.
#[derive(Debug)]
pub struct BenchmarkRunner<'c> {
    clock: &'c Clock,
    spec: WorkloadSpec,
}

impl<'c> BenchmarkRunner<'c> {
    /// Create a runner, rejecting an invalid workload up front.
    pub fn new(clock: &'c Clock, spec: WorkloadSpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self { clock, spec })
    }

    /// Workload this runner drives.
    pub fn spec(&self) -> &WorkloadSpec {
        &self.spec
    }

    /// Run prepare, write, read and finalize.
    pub fn run(&self, strategy: &mut dyn IoStrategy) -> BenchmarkResult {
        self.run_phases(strategy, Phases::ReadWrite)
    }

    /// Run the selected phases. `finalize` is always called exactly once.
    pub fn run_phases(&self, strategy: &mut dyn IoStrategy, phases: Phases) -> BenchmarkResult {
        self.run_with_progress(strategy, phases, None)
    }

    /// Like [`run_phases`](Self::run_phases), reporting each step to
    /// `progress` before it starts.
    pub fn run_with_progress(
        &self,
        strategy: &mut dyn IoStrategy,
        phases: Phases,
        progress: Option<PhaseProgressCallback<'_>>,
    ) -> BenchmarkResult {
        let label = strategy.label();
        tracing::info!("Running {} ({:?})", label, phases);

        let steps = phases.steps();
        let mut step = 0;
        let mut report = || {
            if let Some(callback) = progress {
                callback(PhaseProgress {
                    phase_name: steps[step.min(steps.len() - 1)],
                    phase_index: step,
                    total_phases: steps.len(),
                });
            }
            step += 1;
        };

        let mut strategy = FinalizeGuard::new(strategy);

        report();

        if let Err(e) = strategy.prepare(self.spec.total_range_bytes) {
            tracing::warn!("{}: prepare failed: {}", label, e);
            return BenchmarkResult::unmeasured(label, e.to_string());
        }

        let mut block = Vec::new();
        if let Err(e) = block.try_reserve_exact(self.spec.block_len()) {
            tracing::warn!("{}: block buffer allocation failed: {}", label, e);
            return BenchmarkResult::unmeasured(label, e.to_string());
        }
        block.resize(self.spec.block_len(), strategy.fill_byte());

        let write = match phases {
            Phases::ReadWrite => {
                report();
                self.timed_phase(&mut *strategy, Phase::Write, &mut block)
            }
            Phases::ReadOnly => PhaseOutcome::skipped(),
        };
        report();
        let read = self.timed_phase(&mut *strategy, Phase::Read, &mut block);

        report();
        if let Err(e) = strategy.finish() {
            tracing::warn!("{}: finalize failed: {}", label, e);
        }

        tracing::info!(
            "{}: write {:.2} MB/s, read {:.2} MB/s",
            label,
            write.throughput_mbps(),
            read.throughput_mbps()
        );
        BenchmarkResult::new(label, write, read)
    }

    /// Workload for one phase; reads use a shifted seed.
    fn phase_spec(&self, phase: Phase) -> WorkloadSpec {
        match phase {
            Phase::Write => self.spec,
            Phase::Read => self.spec.with_seed(self.spec.seed.wrapping_add(READ_SEED_OFFSET)),
        }
    }

    fn offsets(&self, pattern: AccessPattern, phase: Phase) -> Result<Box<dyn Iterator<Item = u64>>> {
        Ok(match pattern {
            AccessPattern::Random => Box::new(OffsetGenerator::new(&self.phase_spec(phase))?),
            AccessPattern::SequentialSweep => Box::new(sequential_offsets(&self.spec)?),
        })
    }

    fn timed_phase(
        &self,
        strategy: &mut dyn IoStrategy,
        phase: Phase,
        block: &mut [u8],
    ) -> PhaseOutcome {
        let label = strategy.label();
        let offsets = match self.offsets(strategy.access_pattern(), phase) {
            Ok(offsets) => offsets,
            Err(e) => return PhaseOutcome::failed(e.to_string()),
        };

        let mut attempted = 0u64;
        let mut failed = 0u64;

        let start = self.clock.now();
        for offset in offsets {
            attempted += 1;
            let outcome = match phase {
                Phase::Write => strategy.write_block(offset, block),
                Phase::Read => strategy.read_block(offset, block),
            };
            if let Err(e) = outcome {
                if e.is_transfer_gap() {
                    // No retry: a failed transfer is a gap in the iteration count.
                    if failed == 0 {
                        tracing::debug!("{}: {} gap: {}", label, phase.name(), e);
                    }
                    failed += 1;
                    continue;
                }
                tracing::warn!("{}: {} phase aborted: {}", label, phase.name(), e);
                return PhaseOutcome::failed(e.to_string());
            }
        }
        if phase == Phase::Write
            && let Err(e) = strategy.flush()
        {
            tracing::warn!("{}: durability barrier failed: {}", label, e);
            return PhaseOutcome::failed(e.to_string());
        }
        let end = self.clock.now();
        std::hint::black_box(&block);

        if failed > 0 {
            tracing::warn!(
                "{}: {} of {} {} transfers failed",
                label,
                failed,
                attempted,
                phase.name()
            );
        }
        if attempted == 0 || failed == attempted {
            return PhaseOutcome::failed(format!("all {attempted} {} transfers failed", phase.name()));
        }

        let elapsed_secs = self.clock.elapsed_seconds(start, end);
        if elapsed_secs <= 0.0 {
            return PhaseOutcome::failed("no measurable elapsed time");
        }

        // Denominator is attempted operations, gaps included.
        let bytes = attempted * self.spec.block_size_bytes;
        let stats = PhaseStats {
            elapsed: self.clock.elapsed(start, end),
            attempted_ops: attempted,
            failed_ops: failed,
            bytes,
            throughput_mbps: throughput_mbps(bytes, elapsed_secs),
        };
        tracing::debug!(
            "{}: {} phase {} ops in {:?}",
            label,
            phase.name(),
            attempted,
            stats.elapsed
        );
        PhaseOutcome::Measured(stats)
    }
}
