//! Configuration module
//!
//! The cycle is configured by a JSON attributes document (see `CycleConfig::from_json`).
//! Device credentials for the managed cloud destination come from the environment
//! (`CloudCredentials::from_env`). Everything is validated once at startup; a
//! `ConfigError` means the service does not start.

use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::error::ConfigError;
use crate::schedule::ScheduleWindow;
use crate::upload_mode::UploadMode;

/// Attributes document as written by the operator. Every field is optional here
/// so that missing keys surface as `ConfigError::MissingField` rather than a
/// serde message.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    upload: Option<String>,
    video_store: Option<String>,
    interval: Option<f64>,
    upload_path: Option<PathBuf>,
    path_to_service_account: Option<PathBuf>,
    google_cloud_path: Option<String>,
    #[serde(default)]
    schedule: Vec<RawWindow>,
    video_store_url: Option<String>,
    // Tuning
    buffer_seconds: Option<u64>,
    flush_delay_seconds: Option<u64>,
    capture_timeout_seconds: Option<u64>,
    upload_timeout_seconds: Option<u64>,
    upload_max_attempts: Option<u32>,
    retry_base_delay_ms: Option<u64>,
    file_extension: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawWindow {
    start: String,
    end: String,
}

/// Bucket and credentials for `gcp-project` mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectStorageTarget {
    pub bucket: String,
    /// Key prefix without leading or trailing slashes; empty for none.
    pub prefix: String,
    pub service_account_path: PathBuf,
}

impl ObjectStorageTarget {
    /// Split `google_cloud_path` ("bucket/optional/prefix") into bucket and prefix.
    pub fn parse(google_cloud_path: &str, service_account_path: PathBuf) -> Result<Self, ConfigError> {
        let trimmed = google_cloud_path.trim().trim_matches('/');
        let (bucket, prefix) = match trimmed.split_once('/') {
            Some((bucket, prefix)) => (bucket, prefix.trim_matches('/')),
            None => (trimmed, ""),
        };
        if bucket.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "google_cloud_path",
                reason: "bucket name is empty".to_string(),
            });
        }
        Ok(Self {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            service_account_path,
        })
    }
}

/// Timeouts, retries and file selection for each cycle.
#[derive(Clone, Debug)]
pub struct CycleTuning {
    pub buffer: Duration,
    pub flush_delay: Duration,
    pub capture_timeout: Duration,
    pub upload_timeout: Duration,
    pub upload_max_attempts: u32,
    pub retry_base_delay: Duration,
    pub file_extension: String,
}

impl Default for CycleTuning {
    fn default() -> Self {
        Self {
            buffer: Duration::from_secs(SAFETY_BUFFER_SECS),
            flush_delay: Duration::from_secs(DEFAULT_FLUSH_DELAY_SECS),
            capture_timeout: Duration::from_secs(DEFAULT_CAPTURE_TIMEOUT_SECS),
            upload_timeout: Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS),
            upload_max_attempts: DEFAULT_UPLOAD_MAX_ATTEMPTS,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
        }
    }
}

/// Validated, immutable cycle configuration.
#[derive(Clone, Debug)]
pub struct CycleConfig {
    pub upload: UploadMode,
    /// Resource name of the video store the cycle captures from.
    pub video_store: String,
    pub video_store_url: String,
    pub interval: Duration,
    /// Directory the video store writes saved clips into. Relative file
    /// names reported by the store are resolved against it.
    pub upload_path: PathBuf,
    /// Present in `gcp-project` mode only.
    pub object_storage: Option<ObjectStorageTarget>,
    pub schedule: Vec<ScheduleWindow>,
    pub tuning: CycleTuning,
}

impl CycleConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(raw)?;
        let config = Self::from_raw(raw)?;
        tracing::info!(
            upload = %config.upload,
            video_store = %config.video_store,
            interval_secs = config.interval.as_secs_f64(),
            schedule_windows = config.schedule.len(),
            "Configuration validated successfully"
        );
        Ok(config)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let upload: UploadMode = raw
            .upload
            .as_deref()
            .ok_or(ConfigError::MissingField("upload"))?
            .parse()?;

        let video_store = raw
            .video_store
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingField("video_store"))?;

        let interval_minutes = raw.interval.ok_or(ConfigError::MissingField("interval"))?;
        if !interval_minutes.is_finite()
            || interval_minutes * 60.0 < MIN_INTERVAL_SECS
            || interval_minutes > MAX_INTERVAL_MINUTES
        {
            return Err(ConfigError::InvalidValue {
                field: "interval",
                reason: format!(
                    "must be a number of minutes between {} and {}, got {}",
                    MIN_INTERVAL_SECS / 60.0,
                    MAX_INTERVAL_MINUTES,
                    interval_minutes
                ),
            });
        }
        let interval = Duration::from_secs_f64(interval_minutes * 60.0);

        let mode = match upload {
            UploadMode::ViamCloud => "viam-cloud",
            UploadMode::GcpProject => "gcp-project",
        };
        let upload_path = raw
            .upload_path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigError::MissingModeField {
                field: "upload_path",
                mode,
            })?;

        let object_storage = match upload {
            UploadMode::GcpProject => {
                let service_account_path = raw.path_to_service_account.ok_or(
                    ConfigError::MissingModeField {
                        field: "path_to_service_account",
                        mode,
                    },
                )?;
                let google_cloud_path = raw.google_cloud_path.ok_or(
                    ConfigError::MissingModeField {
                        field: "google_cloud_path",
                        mode,
                    },
                )?;
                Some(ObjectStorageTarget::parse(
                    &google_cloud_path,
                    service_account_path,
                )?)
            }
            UploadMode::ViamCloud => None,
        };

        let schedule = raw
            .schedule
            .iter()
            .enumerate()
            .map(|(index, w)| ScheduleWindow::parse(index, &w.start, &w.end))
            .collect::<Result<Vec<_>, _>>()?;

        let defaults = CycleTuning::default();
        let upload_max_attempts = raw
            .upload_max_attempts
            .unwrap_or(defaults.upload_max_attempts);
        if upload_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "upload_max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        let file_extension = raw
            .file_extension
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .unwrap_or(defaults.file_extension);

        let tuning = CycleTuning {
            buffer: raw
                .buffer_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.buffer),
            flush_delay: raw
                .flush_delay_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.flush_delay),
            capture_timeout: raw
                .capture_timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.capture_timeout),
            upload_timeout: raw
                .upload_timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.upload_timeout),
            upload_max_attempts,
            retry_base_delay: raw
                .retry_base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
            file_extension,
        };
        if tuning.buffer >= interval {
            return Err(ConfigError::InvalidValue {
                field: "buffer_seconds",
                reason: format!(
                    "must be shorter than the interval ({}s), got {}s",
                    interval.as_secs_f64(),
                    tuning.buffer.as_secs()
                ),
            });
        }

        let video_store_url = raw
            .video_store_url
            .or_else(|| env::var("VIDEO_STORE_URL").ok())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_VIDEO_STORE_URL.to_string());

        Ok(CycleConfig {
            upload,
            video_store,
            video_store_url,
            interval,
            upload_path,
            object_storage,
            schedule,
            tuning,
        })
    }

    /// Resources this service depends on; the video store must exist before
    /// the first cycle can run.
    pub fn dependencies(&self) -> Vec<String> {
        vec![self.video_store.clone()]
    }

    /// The interval as a signed duration for range arithmetic.
    pub fn capture_window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.interval.as_millis() as i64)
    }

    pub fn capture_buffer(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.tuning.buffer.as_millis() as i64)
    }
}

/// Device-level credentials for the managed cloud destination.
#[derive(Clone)]
pub struct CloudCredentials {
    pub api_url: String,
    pub api_key_id: String,
    pub api_key: String,
    pub part_id: Option<String>,
}

impl std::fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudCredentials")
            .field("api_url", &self.api_url)
            .field("api_key_id", &self.api_key_id)
            .field("api_key", &"<redacted>")
            .field("part_id", &self.part_id)
            .finish()
    }
}

impl CloudCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Ok(Self {
            api_url: non_empty("VIAM_API_URL").unwrap_or_else(|| DEFAULT_CLOUD_API_URL.to_string()),
            api_key_id: non_empty("VIAM_API_KEY_ID")
                .ok_or(ConfigError::MissingField("VIAM_API_KEY_ID"))?,
            api_key: non_empty("VIAM_API_KEY").ok_or(ConfigError::MissingField("VIAM_API_KEY"))?,
            part_id: non_empty("VIAM_PART_ID"),
        })
    }
}
