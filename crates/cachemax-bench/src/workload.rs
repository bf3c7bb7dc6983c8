//! Reproducible block-aligned offset generation.

use crate::config::{DEFAULT_BLOCK_SIZE, DEFAULT_OPERATIONS, DEFAULT_RANGE_BYTES, DEFAULT_SEED};
use crate::error::{BenchError, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Parameters of one random small-block workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkloadSpec {
    /// Size of the addressed range (and of the target file).
    pub total_range_bytes: u64,
    /// Size of every transfer.
    pub block_size_bytes: u64,
    /// Random operations per phase.
    pub operation_count: u64,
    /// Seed for the offset sequence.
    pub seed: u64,
}

impl Default for WorkloadSpec {
    fn default() -> Self {
        Self {
            total_range_bytes: DEFAULT_RANGE_BYTES,
            block_size_bytes: DEFAULT_BLOCK_SIZE,
            operation_count: DEFAULT_OPERATIONS,
            seed: DEFAULT_SEED,
        }
    }
}

impl WorkloadSpec {
    /// Check that this workload can only yield in-range, block-aligned offsets.
    pub fn validate(&self) -> Result<()> {
        if self.block_size_bytes == 0 {
            return Err(BenchError::InvalidWorkload("block size must be non-zero".into()));
        }
        if self.total_range_bytes < self.block_size_bytes {
            return Err(BenchError::InvalidWorkload(format!(
                "range of {} bytes is smaller than one {}-byte block",
                self.total_range_bytes, self.block_size_bytes
            )));
        }
        if self.total_range_bytes % self.block_size_bytes != 0 {
            return Err(BenchError::InvalidWorkload(format!(
                "range of {} bytes is not a multiple of the {}-byte block size",
                self.total_range_bytes, self.block_size_bytes
            )));
        }
        if usize::try_from(self.block_size_bytes).is_err()
            || usize::try_from(self.total_range_bytes).is_err()
        {
            return Err(BenchError::InvalidWorkload(
                "range does not fit in the address space".into(),
            ));
        }
        if self.operation_count == 0 {
            return Err(BenchError::InvalidWorkload("operation count must be positive".into()));
        }
        Ok(())
    }

    /// Number of blocks in the range.
    pub fn block_count(&self) -> u64 {
        self.total_range_bytes / self.block_size_bytes
    }

    /// Block size as a buffer length. Only meaningful after `validate`.
    pub fn block_len(&self) -> usize {
        usize::try_from(self.block_size_bytes).unwrap_or(usize::MAX)
    }

    /// Same workload with a different seed.
    pub fn with_seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }
}

/// Lazy sequence of uniformly drawn, block-aligned offsets.
///
/// Yields exactly `operation_count` offsets. Constructing a new generator
/// from the same spec reproduces the same sequence.
#[derive(Debug, Clone)]
pub struct OffsetGenerator {
    rng: ChaCha8Rng,
    block_size: u64,
    block_count: u64,
    remaining: u64,
}

impl OffsetGenerator {
    /// Create a generator, rejecting specs that cannot produce valid offsets.
    pub fn new(spec: &WorkloadSpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(spec.seed),
            block_size: spec.block_size_bytes,
            block_count: spec.block_count(),
            remaining: spec.operation_count,
        })
    }
}

impl Iterator for OffsetGenerator {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.rng.random_range(0..self.block_count) * self.block_size)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (n, Some(n))
    }
}

/// Offsets of a full sequential sweep over the range, one per block.
pub fn sequential_offsets(spec: &WorkloadSpec) -> Result<impl Iterator<Item = u64> + use<>> {
    spec.validate()?;
    let block = spec.block_size_bytes;
    Ok((0..spec.block_count()).map(move |i| i * block))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(range: u64, block: u64, ops: u64, seed: u64) -> WorkloadSpec {
        WorkloadSpec {
            total_range_bytes: range,
            block_size_bytes: block,
            operation_count: ops,
            seed,
        }
    }

    #[test]
    fn test_default_spec_is_valid() {
        let spec = WorkloadSpec::default();
        spec.validate().unwrap();
        assert_eq!(spec.block_count(), 8192);
    }

    #[test]
    fn test_offsets_aligned_and_in_range() {
        for (range, block) in [(32 << 20, 4096), (8192, 4096), (4096, 4096), (1 << 20, 512)] {
            let spec = spec(range, block, 5_000, 7);
            let offsets: Vec<u64> = OffsetGenerator::new(&spec).unwrap().collect();
            assert_eq!(offsets.len(), 5_000);
            for offset in offsets {
                assert_eq!(offset % block, 0);
                assert!(offset + block <= range, "offset {offset} escapes range {range}");
            }
        }
    }

    #[test]
    fn test_same_seed_reproduces_sequence() {
        let spec = spec(32 << 20, 4096, 1000, 42);
        let a: Vec<u64> = OffsetGenerator::new(&spec).unwrap().collect();
        let b: Vec<u64> = OffsetGenerator::new(&spec).unwrap().collect();
        assert_eq!(a, b);

        let c: Vec<u64> = OffsetGenerator::new(&spec.with_seed(43)).unwrap().collect();
        assert_ne!(a, c);
    }

    #[test]
    fn test_range_smaller_than_block_rejected() {
        let err = OffsetGenerator::new(&spec(1000, 4096, 10, 1)).unwrap_err();
        assert!(matches!(err, BenchError::InvalidWorkload(_)));
    }

    #[test]
    fn test_misaligned_range_rejected() {
        let err = OffsetGenerator::new(&spec(4096 * 3 + 1, 4096, 10, 1)).unwrap_err();
        assert!(matches!(err, BenchError::InvalidWorkload(_)));
    }

    #[test]
    fn test_zero_operations_and_zero_block_rejected() {
        assert!(spec(4096, 4096, 0, 1).validate().is_err());
        assert!(spec(4096, 0, 10, 1).validate().is_err());
    }

    #[test]
    fn test_single_block_range_always_zero() {
        let offsets: Vec<u64> = OffsetGenerator::new(&spec(4096, 4096, 20, 9)).unwrap().collect();
        assert!(offsets.iter().all(|&o| o == 0));
    }

    #[test]
    fn test_sequential_sweep_covers_range() {
        let offsets: Vec<u64> = sequential_offsets(&spec(16384, 4096, 1, 0)).unwrap().collect();
        assert_eq!(offsets, vec![0, 4096, 8192, 12288]);
    }
}
