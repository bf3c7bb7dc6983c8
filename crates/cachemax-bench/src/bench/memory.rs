//! In-process buffer baseline with no storage involved.

use crate::bench::{AccessPattern, IoStrategy};
use crate::error::{BenchError, Result, TransferOp};

/// Plain memory copies against a heap buffer.
///
/// Measured as one sequential sweep over the whole range, so its numbers are
/// a best-case copy bandwidth rather than a random-access figure.
#[derive(Debug, Default)]
pub struct DirectMemoryStrategy {
    buffer: Vec<u8>,
}

impl DirectMemoryStrategy {
    /// Unprepared strategy.
    pub fn new() -> Self {
        Self::default()
    }

    fn block(&self, offset: u64, len: usize, op: TransferOp) -> Result<usize> {
        if self.buffer.is_empty() {
            return Err(BenchError::NotPrepared);
        }
        let size = self.buffer.len();
        let start = usize::try_from(offset).ok().filter(|&s| s <= size);
        match start {
            Some(start) if size - start >= len => Ok(start),
            _ => Err(BenchError::TransferIncomplete {
                op,
                offset,
                expected: len,
                actual: start.map_or(0, |start| (size - start).min(len)),
            }),
        }
    }
}

impl IoStrategy for DirectMemoryStrategy {
    fn label(&self) -> &'static str {
        "Direct Memory Access"
    }

    fn access_pattern(&self) -> AccessPattern {
        AccessPattern::SequentialSweep
    }

    fn fill_byte(&self) -> u8 {
        0xCC
    }

    fn prepare(&mut self, size_bytes: u64) -> Result<()> {
        let alloc_err = |detail: String| BenchError::ResourceUnavailable {
            what: "memory block",
            path: None,
            source: std::io::Error::new(std::io::ErrorKind::OutOfMemory, detail),
        };

        let size = usize::try_from(size_bytes)
            .map_err(|_| alloc_err(format!("{size_bytes} bytes exceeds the address space")))?;
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(size)
            .map_err(|e| alloc_err(e.to_string()))?;
        buffer.resize(size, 0);
        self.buffer = buffer;
        Ok(())
    }

    fn read_block(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let start = self.block(offset, buf.len(), TransferOp::Read)?;
        buf.copy_from_slice(&self.buffer[start..start + buf.len()]);
        Ok(())
    }

    fn write_block(&mut self, offset: u64, buf: &[u8]) -> Result<()> {
        let start = self.block(offset, buf.len(), TransferOp::Write)?;
        self.buffer[start..start + buf.len()].copy_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.buffer = Vec::new();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_pattern() {
        let mut strategy = DirectMemoryStrategy::new();
        strategy.prepare(32 * 1024).unwrap();

        let pattern: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 256) as u8).collect();
        strategy.write_block(8192, &pattern).unwrap();

        let mut buf = vec![0u8; 4096];
        strategy.read_block(8192, &mut buf).unwrap();
        assert_eq!(buf, pattern);
        strategy.finalize().unwrap();
    }

    #[test]
    fn test_transfer_before_prepare_fails() {
        let mut strategy = DirectMemoryStrategy::new();
        let mut buf = vec![0u8; 4096];
        assert!(matches!(strategy.read_block(0, &mut buf), Err(BenchError::NotPrepared)));
        assert!(matches!(strategy.write_block(0, &buf), Err(BenchError::NotPrepared)));

        strategy.prepare(8192).unwrap();
        strategy.finalize().unwrap();
        assert!(matches!(strategy.read_block(0, &mut buf), Err(BenchError::NotPrepared)));
    }

    #[test]
    fn test_out_of_range_transfer_is_incomplete() {
        let mut strategy = DirectMemoryStrategy::new();
        strategy.prepare(8192).unwrap();
        let mut buf = vec![0u8; 4096];
        let err = strategy.read_block(6144, &mut buf).unwrap_err();
        assert!(err.is_transfer_gap());
    }

    #[test]
    fn test_sequential_sweep_pattern() {
        assert_eq!(DirectMemoryStrategy::new().access_pattern(), AccessPattern::SequentialSweep);
    }
}
