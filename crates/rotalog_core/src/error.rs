//! Error types for rotalog core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in rotalog core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Active file error.
    #[error("storage error: {0}")]
    Storage(#[from] rotalog_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The writer configuration was rejected.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// The writer has been closed.
    #[error("log writer is closed")]
    WriterClosed,

    /// Archiving the active file failed; the writer has no active file.
    #[error("rotation of {} failed: {source}", path.display())]
    RotationFailed {
        /// The active file that could not be archived.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Compressing a backup segment failed.
    #[error("compression of {} failed: {message}", path.display())]
    Compression {
        /// The segment being compressed.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a rotation failure error.
    pub fn rotation_failed(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::RotationFailed {
            path: path.into(),
            source,
        }
    }

    /// Creates a compression error.
    pub fn compression(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Compression {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Converts the error into an `io::Error` for the `std::io::Write` surface.
    ///
    /// I/O errors are returned unchanged so callers see the OS error verbatim.
    pub fn into_io(self) -> io::Error {
        match self {
            Self::Io(err) => err,
            Self::Storage(rotalog_storage::StorageError::Io(err)) => err,
            Self::RotationFailed { source, .. } => source,
            Self::WriterClosed => io::Error::new(io::ErrorKind::BrokenPipe, "log writer is closed"),
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}
