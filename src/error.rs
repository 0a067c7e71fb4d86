//! Error types for homedrive.

use thiserror::Error;

/// Common error type for homedrive.
#[derive(Error, Debug)]
pub enum DriveError {
    /// The path escapes the storage root or contains a malformed segment.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Target entry does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Target entry already exists.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Storing the content would push usage above the configured quota.
    #[error("quota exceeded: {used} bytes used, {incoming} incoming, {quota} allowed")]
    QuotaExceeded {
        /// Bytes currently used under the root.
        used: u64,
        /// Bytes the caller wants to add.
        incoming: u64,
        /// Configured quota in bytes.
        quota: u64,
    },

    /// Underlying I/O error not otherwise classified.
    #[error("operation failed: {0}")]
    OperationFailed(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<zip::result::ZipError> for DriveError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => DriveError::OperationFailed(io),
            other => DriveError::OperationFailed(std::io::Error::other(other)),
        }
    }
}

/// Result type alias for homedrive operations.
pub type Result<T> = std::result::Result<T, DriveError>;
