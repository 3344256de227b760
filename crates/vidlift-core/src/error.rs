//! Error types
//!
//! Each stage of the upload cycle has its own error enum. Configuration errors
//! abort startup; everything else is contained within the cycle that raised it.
//!
//! | type           | raised by            | effect on the cycle                     |
//! |----------------|----------------------|-----------------------------------------|
//! | `ConfigError`  | startup              | service does not start                  |
//! | `CaptureError` | capture invoker      | cycle fails, range retried next tick    |
//! | `UploadError`  | uploaders            | retried (recoverable) or fails the cycle |
//! | `CleanupError` | cleanup manager      | logged only                             |

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing config attribute '{0}'")]
    MissingField(&'static str),

    #[error("Missing config attribute '{field}' for {mode} mode")]
    MissingModeField {
        field: &'static str,
        mode: &'static str,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Invalid schedule window #{index}: {reason}")]
    InvalidSchedule { index: usize, reason: String },

    #[error("Invalid credentials at {path}: {reason}")]
    Credentials { path: PathBuf, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Destination setup failed: {0}")]
    Destination(String),
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Video store '{resource}' unreachable: {reason}")]
    Unreachable { resource: String, reason: String },

    #[error("Video store save timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Invalid capture range: start {start} is not before end {end}")]
    InvalidRange { start: String, end: String },

    #[error("Video store save produced no files")]
    NoOutput,

    #[error("Failed to collect captured files: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    /// Whether retrying the same range on the next tick is meaningful.
    ///
    /// `InvalidRange` is a contract violation from the tracker and will not go
    /// away by itself.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CaptureError::InvalidRange { .. })
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    /// Transient: network timeout, 5xx, credential refresh. Retry is meaningful.
    #[error("Upload failed (recoverable): {0}")]
    Recoverable(String),

    /// Permanent: malformed credentials, missing bucket, rejected request.
    #[error("Upload failed (fatal): {0}")]
    Fatal(String),
}

impl UploadError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, UploadError::Recoverable(_))
    }
}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                UploadError::Fatal(format!("cannot read local file: {}", err))
            }
            _ => UploadError::Recoverable(format!("local read failed: {}", err)),
        }
    }
}

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("File already gone: {0}")]
    AlreadyGone(PathBuf),

    #[error("Failed to delete {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
