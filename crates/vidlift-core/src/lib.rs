//! vidlift core library
//!
//! Domain types shared by every vidlift crate:
//! - Configuration loading and validation (`config`)
//! - Schedule window evaluation (`schedule`)
//! - Safe capture range tracking (`range`)
//! - Capture/upload models and the error taxonomy
//!
//! Nothing in this crate performs network I/O; the upload destinations live in
//! `vidlift-storage` and the cycle itself in `vidlift-worker`.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod range;
pub mod schedule;
pub mod upload_mode;

// Re-export commonly used types
pub use config::{CloudCredentials, CycleConfig, CycleTuning, ObjectStorageTarget};
pub use error::{CaptureError, CleanupError, ConfigError, UploadError};
pub use models::{CaptureRange, CaptureResult, CapturedFile, UploadOutcome, UploadReceipt};
pub use range::{next_range, RangeTracker};
pub use schedule::{is_allowed, ScheduleWindow};
pub use upload_mode::UploadMode;
