//! Centralized error types for billdrop.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the billdrop library.
#[derive(Error, Debug)]
pub enum BilldropError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified mail archive does not exist.
    #[error("Mailbox not found: {0}")]
    MailboxNotFound(PathBuf),

    /// The file does not appear to be a valid MBOX archive.
    #[error("File does not appear to be a valid MBOX: {0}")]
    InvalidMbox(PathBuf),

    /// An invalid path was provided.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Convenience alias for `Result<T, BilldropError>`.
pub type Result<T> = std::result::Result<T, BilldropError>;

impl BilldropError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Allow `?` on `std::io::Error` inside functions returning `BilldropError`
/// when no path context is available (rare — prefer `BilldropError::io`).
impl From<std::io::Error> for BilldropError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
