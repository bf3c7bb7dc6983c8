//! Error types for the measurement engine.

use std::path::PathBuf;
use thiserror::Error;

/// Which block transfer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOp {
    Read,
    Write,
}

impl std::fmt::Display for TransferOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Errors raised by the clock, workload generator, and I/O strategies.
#[derive(Debug, Error)]
pub enum BenchError {
    /// An allocation, file open, or mapping could not be obtained.
    #[error("{what} unavailable{}: {source}", path.as_ref().map(|p| format!(" ({})", p.display())).unwrap_or_default())]
    ResourceUnavailable {
        /// What was being acquired (e.g. "mapping", "test file").
        what: &'static str,
        /// File involved, if any.
        path: Option<PathBuf>,
        /// Underlying cause.
        #[source]
        source: std::io::Error,
    },

    /// The workload parameters cannot produce in-range, block-aligned offsets.
    #[error("invalid workload: {0}")]
    InvalidWorkload(String),

    /// A block transfer moved fewer bytes than requested or failed outright.
    #[error("{op} of {expected} bytes at offset {offset} transferred {actual} bytes")]
    TransferIncomplete {
        op: TransferOp,
        offset: u64,
        expected: usize,
        actual: usize,
    },

    /// A transfer was issued before `prepare` succeeded.
    #[error("strategy used before prepare()")]
    NotPrepared,

    /// The monotonic clock could not be calibrated. Fatal to the whole run.
    #[error("clock unavailable: {0}")]
    ClockUnavailable(String),
}

impl BenchError {
    /// Build a `ResourceUnavailable` for a file-backed resource.
    pub fn resource(what: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ResourceUnavailable {
            what,
            path: Some(path.into()),
            source,
        }
    }

    /// True for a failed block transfer, which the runner counts as a gap
    /// instead of abandoning the phase.
    pub fn is_transfer_gap(&self) -> bool {
        matches!(self, Self::TransferIncomplete { .. })
    }
}

/// Result alias used across the engine.
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_display_includes_path() {
        let err = BenchError::resource(
            "test file",
            "/tmp/x.dat",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        let msg = err.to_string();
        assert!(msg.contains("test file unavailable"));
        assert!(msg.contains("/tmp/x.dat"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn test_transfer_is_gap() {
        let err = BenchError::TransferIncomplete {
            op: TransferOp::Read,
            offset: 4096,
            expected: 4096,
            actual: 12,
        };
        assert!(err.is_transfer_gap());
        assert_eq!(
            err.to_string(),
            "read of 4096 bytes at offset 4096 transferred 12 bytes"
        );
        assert!(!BenchError::NotPrepared.is_transfer_gap());
    }
}
