//! # Design
//!
//! - Provide structured, constant-message errors for artifact finalization.
//! - Capture operation context (operation name, path) to make failures
//!   reproducible in tests.
//! - Preserve source errors without interpolating context into error messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for finalization operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by artifact finalization.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failures while interacting with the filesystem.
    #[error("finalize io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn io_helper_preserves_context() {
        let err = FsOpsError::io("relocate.rename", "/tmp/a.flv", io::Error::other("io"));
        let FsOpsError::Io {
            operation, path, ..
        } = &err;
        assert_eq!(*operation, "relocate.rename");
        assert_eq!(path, &PathBuf::from("/tmp/a.flv"));
        assert!(err.source().is_some());
    }
}
