//! Capture and upload models

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::UploadError;

/// Half-open time range `[start, end)` requested from the video store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CaptureRange {
    /// Returns `None` unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for CaptureRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// A local file produced by the video store for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFile {
    pub path: PathBuf,
    pub file_name: String,
}

impl CapturedFile {
    /// Build from a path; `None` when the path has no UTF-8 file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let file_name = path.file_name()?.to_str()?.to_string();
        Some(Self { path, file_name })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Files written by a single save for the requested range.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub range: CaptureRange,
    pub files: Vec<CapturedFile>,
    /// Files already in the upload directory before the save, left behind
    /// by earlier cycles. They do not belong to `range`.
    pub leftovers: Vec<CapturedFile>,
}

/// Acknowledgement from a destination that the full file is durably stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub file_name: String,
    pub location: String,
    pub size_bytes: u64,
}

/// Per-file result of an upload, after in-cycle retries.
#[derive(Debug)]
pub enum UploadOutcome {
    Success(UploadReceipt),
    RecoverableFailure { attempts: u32, error: UploadError },
    FatalFailure(UploadError),
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success(_))
    }
}
