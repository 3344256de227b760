//! Default values for cycle tuning and device endpoints.

/// Seconds subtracted from "now" for the end of a capture range, so that any
/// segment straddling the end has been flushed by the recorder.
pub const SAFETY_BUFFER_SECS: u64 = 30;

/// Delay between a successful save and collecting the produced files.
pub const DEFAULT_FLUSH_DELAY_SECS: u64 = 5;

pub const DEFAULT_CAPTURE_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 300;

/// Upload attempts per file within a single cycle (first try included).
pub const DEFAULT_UPLOAD_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;
pub const MAX_RETRY_DELAY_SECS: u64 = 60;

/// Only files with this extension are picked up from the upload directory.
pub const DEFAULT_FILE_EXTENSION: &str = "mp4";

/// Lower bound on the configured interval.
pub const MIN_INTERVAL_SECS: f64 = 1.0;

/// Upper bound on the configured interval (one week).
pub const MAX_INTERVAL_MINUTES: f64 = 7.0 * 24.0 * 60.0;

/// Timestamp layout understood by the video store's `save` command.
pub const SAVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%SZ";

pub const DEFAULT_VIDEO_STORE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_CLOUD_API_URL: &str = "https://app.viam.com";
