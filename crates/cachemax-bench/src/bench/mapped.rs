//! Zero-copy access through a full-file read-write mapping.

use crate::bench::IoStrategy;
use crate::error::{BenchError, Result, TransferOp};
use memmap2::MmapMut;
use std::fs::{File, OpenOptions};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Block transfers are plain memory copies against a mapped view of the
/// target file. No system call is made per block.
#[derive(Debug)]
pub struct MappedFileStrategy {
    path: PathBuf,
    file: Option<File>,
    map: Option<MmapMut>,
    dirty: bool,
}

impl MappedFileStrategy {
    /// Strategy targeting `path`. The file is recreated by `prepare`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            map: None,
            dirty: false,
        }
    }

    /// Target path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IoStrategy for MappedFileStrategy {
    fn label(&self) -> &'static str {
        "Memory Mapped (Zero-Copy 4K Random)"
    }

    fn fill_byte(&self) -> u8 {
        0xBB
    }

    fn prepare(&mut self, size_bytes: u64) -> Result<()> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| BenchError::resource("test file", &self.path, e))?;

        // Size only; no content is written.
        file.set_len(size_bytes)
            .map_err(|e| BenchError::resource("test file", &self.path, e))?;

        // SAFETY: the file was just created by this strategy and is held open
        // exclusively for the mapping's lifetime; nothing else resizes it.
        let map = unsafe { MmapMut::map_mut(&file) }
            .map_err(|e| BenchError::resource("mapping", &self.path, e))?;

        tracing::debug!("Mapped {} bytes of {}", map.len(), self.path.display());
        self.file = Some(file);
        self.map = Some(map);
        self.dirty = false;
        Ok(())
    }

    fn read_block(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let map = self.map.as_ref().ok_or(BenchError::NotPrepared)?;
        let range = block_range(offset, buf.len(), map.len(), TransferOp::Read)?;
        buf.copy_from_slice(&map[range]);
        Ok(())
    }

    fn write_block(&mut self, offset: u64, buf: &[u8]) -> Result<()> {
        let map = self.map.as_mut().ok_or(BenchError::NotPrepared)?;
        let range = block_range(offset, buf.len(), map.len(), TransferOp::Write)?;
        map[range].copy_from_slice(buf);
        self.dirty = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let map = self.map.as_ref().ok_or(BenchError::NotPrepared)?;
        map.flush()
            .map_err(|e| BenchError::resource("mapped view flush", &self.path, e))?;
        self.dirty = false;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let result = if self.dirty && self.map.is_some() {
            self.flush()
        } else {
            Ok(())
        };
        if let Err(e) = &result {
            tracing::warn!("Flush before unmap failed for {}: {}", self.path.display(), e);
        }

        // Unmap first, then close.
        drop(self.map.take());
        drop(self.file.take());
        self.dirty = false;
        result
    }
}

/// Byte range of a block inside a mapping of `mapped` bytes.
fn block_range(offset: u64, len: usize, mapped: usize, op: TransferOp) -> Result<Range<usize>> {
    let start = usize::try_from(offset).ok().filter(|&start| start <= mapped);
    match start {
        Some(start) if mapped - start >= len => Ok(start..start + len),
        _ => Err(BenchError::TransferIncomplete {
            op,
            offset,
            expected: len,
            actual: start.map_or(0, |start| (mapped - start).min(len)),
        }),
    }
}
