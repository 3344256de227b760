//! Capture invoker
//!
//! Turns a `CaptureRange` into local files: asks the video store to save the
//! range, gives the store time to flush, then gathers what it wrote.
//!
//! The upload directory is snapshotted before each save. Only files that
//! appear or change during the save belong to the cycle; anything that was
//! already there is reported separately as a leftover from earlier cycles.

use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use vidlift_core::{CaptureError, CaptureRange, CaptureResult, CapturedFile, CycleConfig};
use walkdir::WalkDir;

use crate::video_store::{VideoStore, VideoStoreError};

type Snapshot = HashMap<PathBuf, Option<SystemTime>>;

pub struct CaptureInvoker {
    store: Arc<dyn VideoStore>,
    upload_path: PathBuf,
    capture_timeout: Duration,
    flush_delay: Duration,
    file_extension: String,
}

impl CaptureInvoker {
    pub fn new(store: Arc<dyn VideoStore>, config: &CycleConfig) -> Self {
        Self {
            store,
            upload_path: config.upload_path.clone(),
            capture_timeout: config.tuning.capture_timeout,
            flush_delay: config.tuning.flush_delay,
            file_extension: config.tuning.file_extension.clone(),
        }
    }

    #[tracing::instrument(skip(self), fields(resource = %self.store.name(), start = %range.start, end = %range.end))]
    pub async fn save(&self, range: &CaptureRange) -> Result<CaptureResult, CaptureError> {
        if range.start >= range.end {
            return Err(CaptureError::InvalidRange {
                start: range.start.to_rfc3339(),
                end: range.end.to_rfc3339(),
            });
        }

        let before = self.snapshot().await?;

        let started = std::time::Instant::now();
        let response = tokio::time::timeout(
            self.capture_timeout,
            self.store.save(range.start, range.end),
        )
        .await
        .map_err(|_| CaptureError::Timeout(self.capture_timeout))?
        .map_err(|e| self.store_error(e))?;

        tracing::debug!(
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Video store accepted save"
        );

        if !self.flush_delay.is_zero() {
            tokio::time::sleep(self.flush_delay).await;
        }

        let after = self.snapshot().await?;
        let files = match self.named_files(&response).await {
            Some(named) => named,
            None => sorted(
                after
                    .iter()
                    .filter(|(path, modified)| before.get(*path) != Some(*modified))
                    .filter_map(|(path, _)| CapturedFile::from_path(path.clone()))
                    .collect(),
            ),
        };
        if files.is_empty() {
            if !after.is_empty() {
                tracing::warn!(existing = after.len(), "Save wrote no new files to the upload directory");
            }
            return Err(CaptureError::NoOutput);
        }

        let leftovers = after
            .keys()
            .filter(|path| before.contains_key(*path) && !files.iter().any(|f| &f.path == *path))
            .filter_map(|path| CapturedFile::from_path(path.clone()))
            .collect::<Vec<_>>();

        tracing::info!(files = files.len(), leftovers = leftovers.len(), "Capture produced files");
        Ok(CaptureResult {
            range: *range,
            files,
            leftovers: sorted(leftovers),
        })
    }

    fn store_error(&self, err: VideoStoreError) -> CaptureError {
        CaptureError::Unreachable {
            resource: self.store.name().to_string(),
            reason: err.to_string(),
        }
    }

    /// Files the store named in its response that exist on disk, or `None`
    /// when the response names nothing.
    async fn named_files(&self, response: &Value) -> Option<Vec<CapturedFile>> {
        let named = reported_file_names(response);
        if named.is_empty() {
            return None;
        }
        let mut files = Vec::with_capacity(named.len());
        for name in named {
            let path = self.resolve(&name);
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {
                    if let Some(file) = CapturedFile::from_path(path) {
                        files.push(file);
                    }
                }
                _ => {
                    tracing::warn!(file = %path.display(), "Reported file not found on disk");
                }
            }
        }
        Some(files)
    }

    /// Matching files in the upload directory with their modification times.
    async fn snapshot(&self) -> Result<Snapshot, CaptureError> {
        let dir = self.upload_path.clone();
        let extension = self.file_extension.clone();
        tokio::task::spawn_blocking(move || -> Result<Snapshot, CaptureError> {
            let files = scan_directory(&dir, &extension)?;
            Ok(files
                .into_iter()
                .map(|file| {
                    let modified = std::fs::metadata(&file.path).and_then(|m| m.modified()).ok();
                    (file.path, modified)
                })
                .collect())
        })
        .await
        .map_err(|e| CaptureError::Io(std::io::Error::other(e)))?
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let path = PathBuf::from(name);
        if path.is_relative() {
            self.upload_path.join(path)
        } else {
            path
        }
    }
}

fn sorted(mut files: Vec<CapturedFile>) -> Vec<CapturedFile> {
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

/// File names from a save response: a `filename` string and/or a `filenames` array.
fn reported_file_names(response: &Value) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(name) = response.get("filename").and_then(Value::as_str) {
        names.push(name.to_string());
    }
    if let Some(list) = response.get("filenames").and_then(Value::as_array) {
        names.extend(list.iter().filter_map(Value::as_str).map(str::to_string));
    }
    names.retain(|n| !n.trim().is_empty());
    names.dedup();
    names
}

/// All files under `dir` with `extension` (case-insensitive), in path order.
pub(crate) fn scan_directory(dir: &Path, extension: &str) -> Result<Vec<CapturedFile>, CaptureError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if matches {
            if let Some(file) = CapturedFile::from_path(entry.into_path()) {
                files.push(file);
            }
        }
    }
    Ok(files)
}
