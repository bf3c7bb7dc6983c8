//! Positioned synchronous file I/O.

use crate::bench::IoStrategy;
use crate::config::PREFILL_CHUNK;
use crate::error::{BenchError, Result, TransferOp};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// How the target file is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Always recreate and pre-fill the file, then open it read-write.
    Recreate,
    /// Open an existing file read-only. The file must already cover the
    /// addressed range; it is never created, extended, or written.
    ReadExisting,
}

/// One positioned read or write system call per block.
#[derive(Debug)]
pub struct SyncFileStrategy {
    path: PathBuf,
    mode: OpenMode,
    file: Option<File>,
    dirty: bool,
}

impl SyncFileStrategy {
    /// Strategy targeting `path`.
    pub fn new(path: impl Into<PathBuf>, mode: OpenMode) -> Self {
        Self {
            path: path.into(),
            mode,
            file: None,
            dirty: false,
        }
    }

    /// Target path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check that an existing target covers the whole addressed range.
    ///
    /// A missing or short file is never created or extended.
    fn check_existing(&self, size_bytes: u64) -> Result<()> {
        let meta = std::fs::metadata(&self.path)
            .map_err(|e| BenchError::resource("existing file", &self.path, e))?;
        if meta.len() < size_bytes {
            return Err(BenchError::resource(
                "existing file",
                &self.path,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("{} bytes, range needs {size_bytes}", meta.len()),
                ),
            ));
        }
        Ok(())
    }

    /// Recreate the file, write it sequentially up to `size_bytes` and make
    /// it durable.
    fn prefill(&self, size_bytes: u64) -> Result<()> {
        let mut chunk = Vec::new();
        chunk.try_reserve_exact(PREFILL_CHUNK).map_err(|e| {
            BenchError::resource(
                "pre-fill buffer",
                &self.path,
                io::Error::new(io::ErrorKind::OutOfMemory, e),
            )
        })?;
        chunk.resize(PREFILL_CHUNK, self.fill_byte());

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| BenchError::resource("test file", &self.path, e))?;

        let mut written = 0;
        while written < size_bytes {
            let len = usize::try_from(size_bytes - written)
                .map_or(PREFILL_CHUNK, |rest| rest.min(PREFILL_CHUNK));
            file.write_all(&chunk[..len])
                .map_err(|e| BenchError::resource("test file", &self.path, e))?;
            written += len as u64;
        }

        let durable =
            durable_sync(&file).map_err(|e| BenchError::resource("test file", &self.path, e))?;
        if !durable {
            tracing::debug!("{}: full sync unsupported, used data sync", self.path.display());
        }
        tracing::debug!("Pre-filled {} with {} bytes", self.path.display(), size_bytes);
        Ok(())
    }

    fn file(&self) -> Result<&File> {
        self.file.as_ref().ok_or(BenchError::NotPrepared)
    }
}

impl IoStrategy for SyncFileStrategy {
    fn label(&self) -> &'static str {
        "Traditional Read/Write (4K Random)"
    }

    fn fill_byte(&self) -> u8 {
        0xAA
    }

    fn prepare(&mut self, size_bytes: u64) -> Result<()> {
        match self.mode {
            OpenMode::Recreate => self.prefill(size_bytes)?,
            OpenMode::ReadExisting => self.check_existing(size_bytes)?,
        }

        let writable = self.mode == OpenMode::Recreate;
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(&self.path)
            .map_err(|e| BenchError::resource("test file", &self.path, e))?;
        self.file = Some(file);
        self.dirty = false;
        Ok(())
    }

    fn read_block(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let file = self.file()?;
        let expected = buf.len();
        let actual = match read_at(file, buf, offset) {
            Ok(n) => n,
            Err(e) => {
                tracing::debug!("read at {offset} failed: {e}");
                0
            }
        };
        if actual != expected {
            return Err(BenchError::TransferIncomplete {
                op: TransferOp::Read,
                offset,
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn write_block(&mut self, offset: u64, buf: &[u8]) -> Result<()> {
        if self.mode == OpenMode::ReadExisting {
            return Err(BenchError::resource(
                "writable handle",
                &self.path,
                io::Error::new(io::ErrorKind::PermissionDenied, "target opened read-only"),
            ));
        }
        self.dirty = true;
        let file = self.file()?;
        let expected = buf.len();
        let actual = match write_at(file, buf, offset) {
            Ok(n) => n,
            Err(e) => {
                tracing::debug!("write at {offset} failed: {e}");
                0
            }
        };
        if actual != expected {
            return Err(BenchError::TransferIncomplete {
                op: TransferOp::Write,
                offset,
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let file = self.file()?;
        durable_sync(file).map_err(|e| BenchError::resource("durability barrier", &self.path, e))?;
        self.dirty = false;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let result = if self.dirty && self.file.is_some() {
            self.flush()
        } else {
            Ok(())
        };
        // Dropping the handle closes it.
        self.file = None;
        self.dirty = false;
        result
    }
}

/// `sync_all`, falling back to `sync_data` on layers that reject a full sync.
///
/// Returns `Ok(true)` for a full sync and `Ok(false)` when only a partial (or
/// no) sync was possible. Some mounted filesystems answer `F_FULLFSYNC` with
/// `ENOTTY`.
pub(crate) fn durable_sync(file: &File) -> io::Result<bool> {
    match file.sync_all() {
        Ok(()) => Ok(true),
        Err(e) if is_enotty(&e) => match file.sync_data() {
            Ok(()) => Ok(false),
            Err(e2) if is_enotty(&e2) => Ok(false),
            Err(e2) => Err(e2),
        },
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn is_enotty(e: &io::Error) -> bool {
    const ENOTTY: i32 = 25;
    e.raw_os_error() == Some(ENOTTY)
}

// Win32 error codes do not share the errno numbering.
#[cfg(not(unix))]
fn is_enotty(_e: &io::Error) -> bool {
    false
}

#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    std::os::unix::fs::FileExt::read_at(file, buf, offset)
}

#[cfg(unix)]
fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    std::os::unix::fs::FileExt::write_at(file, buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    std::os::windows::fs::FileExt::seek_read(file, buf, offset)
}

#[cfg(windows)]
fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    std::os::windows::fs::FileExt::seek_write(file, buf, offset)
}

#[cfg(not(any(unix, windows)))]
fn read_at(mut file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::io::{Read, Seek, SeekFrom};
    file.seek(SeekFrom::Start(offset))?;
    file.read(buf)
}

#[cfg(not(any(unix, windows)))]
fn write_at(mut file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    use std::io::{Seek, SeekFrom};
    file.seek(SeekFrom::Start(offset))?;
    file.write(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_prefills_to_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefill.dat");
        let mut strategy = SyncFileStrategy::new(&path, OpenMode::Recreate);
        strategy.prepare(3 * 1024 * 1024 + 4096).unwrap();
        strategy.finalize().unwrap();

        let content = std::fs::read(&path).unwrap();
        assert_eq!(content.len(), 3 * 1024 * 1024 + 4096);
        assert!(content.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_write_then_read_block() {
        let dir = TempDir::new().unwrap();
        let mut strategy = SyncFileStrategy::new(dir.path().join("rw.dat"), OpenMode::Recreate);
        strategy.prepare(64 * 1024).unwrap();

        let pattern: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        strategy.write_block(8192, &pattern).unwrap();
        strategy.flush().unwrap();

        let mut buf = vec![0u8; 4096];
        strategy.read_block(8192, &mut buf).unwrap();
        assert_eq!(buf, pattern);
        strategy.finalize().unwrap();
    }

    #[test]
    fn test_read_past_end_is_incomplete() {
        let dir = TempDir::new().unwrap();
        let mut strategy = SyncFileStrategy::new(dir.path().join("short.dat"), OpenMode::Recreate);
        strategy.prepare(8192).unwrap();
        let mut buf = vec![0u8; 4096];
        let err = strategy.read_block(6144, &mut buf).unwrap_err();
        assert!(matches!(
            err,
            BenchError::TransferIncomplete { op: TransferOp::Read, actual: 2048, .. }
        ));
    }

    #[test]
    fn test_transfer_before_prepare_fails() {
        let mut strategy = SyncFileStrategy::new("/nonexistent/never.dat", OpenMode::Recreate);
        let mut buf = vec![0u8; 16];
        assert!(matches!(strategy.read_block(0, &mut buf), Err(BenchError::NotPrepared)));
    }

    #[test]
    fn test_open_failure_is_resource_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing_dir").join("x.dat");
        let mut strategy = SyncFileStrategy::new(path, OpenMode::Recreate);
        let err = strategy.prepare(4096).unwrap_err();
        assert!(matches!(err, BenchError::ResourceUnavailable { .. }));
    }

    #[test]
    fn test_read_existing_keeps_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("existing.dat");
        std::fs::write(&path, vec![0x5Au8; 16384]).unwrap();

        let mut strategy = SyncFileStrategy::new(&path, OpenMode::ReadExisting);
        strategy.prepare(16384).unwrap();
        let mut buf = vec![0u8; 4096];
        strategy.read_block(4096, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0x5A));
        assert!(matches!(
            strategy.write_block(0, &buf),
            Err(BenchError::ResourceUnavailable { .. })
        ));
        strategy.finalize().unwrap();
    }

    #[test]
    fn test_read_existing_rejects_short_file_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short_existing.dat");
        std::fs::write(&path, vec![0x11u8; 100]).unwrap();

        let mut strategy = SyncFileStrategy::new(&path, OpenMode::ReadExisting);
        let err = strategy.prepare(8192).unwrap_err();
        assert!(matches!(err, BenchError::ResourceUnavailable { .. }));
        strategy.finalize().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), vec![0x11u8; 100]);
    }

    #[test]
    fn test_read_existing_never_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.dat");

        let mut strategy = SyncFileStrategy::new(&path, OpenMode::ReadExisting);
        let err = strategy.prepare(8192).unwrap_err();
        assert!(matches!(err, BenchError::ResourceUnavailable { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_is_enotty_matches_only_enotty() {
        assert!(!is_enotty(&io::Error::other("plain")));
        #[cfg(unix)]
        {
            assert!(is_enotty(&io::Error::from_raw_os_error(25)));
            assert!(!is_enotty(&io::Error::from_raw_os_error(5)));
        }
        #[cfg(not(unix))]
        assert!(!is_enotty(&io::Error::from_raw_os_error(25)));
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut strategy = SyncFileStrategy::new(dir.path().join("twice.dat"), OpenMode::Recreate);
        strategy.prepare(4096).unwrap();
        strategy.write_block(0, &[1u8; 4096]).unwrap();
        strategy.finalize().unwrap();
        strategy.finalize().unwrap();
    }
}
