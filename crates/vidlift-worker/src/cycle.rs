//! Cycle orchestrator
//!
//! One cycle walks `Idle → Evaluating → Capturing → Uploading → CleaningUp`
//! and returns to `Idle`. It can stop early as `Skipped` (schedule window
//! closed, or no safe range yet) or `Failed` (capture error, failed upload,
//! shutdown). Only a cycle that reaches `CleaningUp` advances the range
//! tracker, so the next cycle after a skip or failure asks for the same start.
//!
//! Files left in the upload directory by earlier cycles are retried after the
//! cycle's own files, best effort. Their outcome never changes the phase.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use vidlift_core::{
    is_allowed, CaptureError, CaptureRange, CaptureResult, CapturedFile, CleanupError, CycleConfig, RangeTracker,
    ScheduleWindow, UploadOutcome, UploadReceipt,
};
use vidlift_storage::Uploader;

use crate::capture::CaptureInvoker;
use crate::cleanup::CleanupManager;
use crate::retry::{upload_with_retry, RetryPolicy};
use crate::video_store::VideoStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    OutsideSchedule,
    /// `now - buffer` is not after the start of the next range.
    EmptyRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Capture(String),
    /// The tracker produced a range the capture invoker refused.
    InvalidRange(String),
    /// At least one file failed to upload.
    Upload { failed: usize },
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Evaluating,
    Capturing,
    Uploading,
    CleaningUp,
    Skipped(SkipReason),
    Failed(FailureReason),
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CyclePhase::Idle => write!(f, "idle"),
            CyclePhase::Evaluating => write!(f, "evaluating"),
            CyclePhase::Capturing => write!(f, "capturing"),
            CyclePhase::Uploading => write!(f, "uploading"),
            CyclePhase::CleaningUp => write!(f, "cleaning_up"),
            CyclePhase::Skipped(reason) => write!(f, "skipped({:?})", reason),
            CyclePhase::Failed(reason) => write!(f, "failed({:?})", reason),
        }
    }
}

#[derive(Debug)]
pub struct FailedUpload {
    pub file: CapturedFile,
    pub outcome: UploadOutcome,
}

/// What happened in one cycle. `phase` is the terminal phase: `CleaningUp`
/// for a completed cycle, otherwise `Skipped` or `Failed`.
#[derive(Debug)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub phase: CyclePhase,
    pub range: Option<CaptureRange>,
    pub uploaded: Vec<UploadReceipt>,
    pub failed: Vec<FailedUpload>,
    /// Leftovers from earlier cycles uploaded by this one.
    pub leftover_uploaded: Vec<UploadReceipt>,
    pub leftover_failed: Vec<FailedUpload>,
    pub cleanup_failures: Vec<CleanupError>,
}

impl CycleReport {
    fn new(cycle_id: Uuid) -> Self {
        Self {
            cycle_id,
            phase: CyclePhase::Idle,
            range: None,
            uploaded: Vec::new(),
            failed: Vec::new(),
            leftover_uploaded: Vec::new(),
            leftover_failed: Vec::new(),
            cleanup_failures: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == CyclePhase::CleaningUp
    }
}

pub struct CycleRunner {
    schedule: Vec<ScheduleWindow>,
    tracker: RangeTracker,
    capture: CaptureInvoker,
    uploader: Arc<dyn Uploader>,
    retry: RetryPolicy,
    upload_timeout: Duration,
    cleanup: CleanupManager,
    cancel: CancellationToken,
}

impl CycleRunner {
    pub fn new(config: &CycleConfig, store: Arc<dyn VideoStore>, uploader: Arc<dyn Uploader>) -> Self {
        Self {
            schedule: config.schedule.clone(),
            tracker: RangeTracker::new(config.capture_window(), config.capture_buffer()),
            capture: CaptureInvoker::new(store, config),
            uploader,
            retry: RetryPolicy::from_tuning(&config.tuning),
            upload_timeout: config.tuning.upload_timeout,
            cleanup: CleanupManager::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Observe `token` between steps; once cancelled, the running cycle ends
    /// as `Failed(Interrupted)` after its current step.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn last_end(&self) -> Option<DateTime<Utc>> {
        self.tracker.last_end()
    }

    #[tracing::instrument(skip(self), fields(cycle_id = tracing::field::Empty))]
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        let cycle_id = Uuid::new_v4();
        tracing::Span::current().record("cycle_id", tracing::field::display(cycle_id));
        let started = std::time::Instant::now();
        let mut report = CycleReport::new(cycle_id);

        self.run_phases(now, &mut report).await;

        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        match &report.phase {
            CyclePhase::CleaningUp => tracing::info!(
                phase = %report.phase,
                uploaded = report.uploaded.len(),
                leftovers_uploaded = report.leftover_uploaded.len(),
                cleanup_failures = report.cleanup_failures.len(),
                last_end = ?self.tracker.last_end(),
                duration_ms,
                "Cycle completed"
            ),
            CyclePhase::Skipped(_) => tracing::info!(phase = %report.phase, duration_ms, "Cycle skipped"),
            _ => tracing::warn!(
                phase = %report.phase,
                uploaded = report.uploaded.len(),
                failed = report.failed.len(),
                last_end = ?self.tracker.last_end(),
                duration_ms,
                "Cycle failed; range will be retried"
            ),
        }
        report
    }

    async fn run_phases(&mut self, now: DateTime<Utc>, report: &mut CycleReport) {
        self.enter(report, CyclePhase::Evaluating);
        if !is_allowed(now, &self.schedule) {
            self.enter(report, CyclePhase::Skipped(SkipReason::OutsideSchedule));
            return;
        }
        let range = match self.tracker.next_range(now) {
            Some(range) => range,
            None => {
                self.enter(report, CyclePhase::Skipped(SkipReason::EmptyRange));
                return;
            }
        };
        report.range = Some(range);
        if self.interrupted(report) {
            return;
        }

        self.enter(report, CyclePhase::Capturing);
        let captured = match self.capture.save(&range).await {
            Ok(captured) => captured,
            Err(err @ CaptureError::InvalidRange { .. }) => {
                tracing::error!(error = %err, "Tracker produced an invalid range");
                self.enter(report, CyclePhase::Failed(FailureReason::InvalidRange(err.to_string())));
                return;
            }
            Err(err) => {
                tracing::warn!(error = %err, recoverable = err.is_recoverable(), "Capture failed");
                self.enter(report, CyclePhase::Failed(FailureReason::Capture(err.to_string())));
                return;
            }
        };
        if self.interrupted(report) {
            return;
        }

        let CaptureResult { files, leftovers, .. } = captured;
        self.upload_range(&range, files, report).await;

        if !leftovers.is_empty() && !self.cancel.is_cancelled() {
            self.upload_leftovers(leftovers, report).await;
        }
    }

    async fn upload_range(
        &mut self,
        range: &CaptureRange,
        files: Vec<CapturedFile>,
        report: &mut CycleReport,
    ) {
        self.enter(report, CyclePhase::Uploading);
        let (uploaded, failed) = self.upload_all(files).await;
        report.uploaded = uploaded.iter().map(|(receipt, _)| receipt.clone()).collect();
        report.failed = failed;

        // Uploaded files are safe to delete even when others in the cycle
        // failed or shutdown began.
        if !uploaded.is_empty() {
            if report.failed.is_empty() && !self.cancel.is_cancelled() {
                self.enter(report, CyclePhase::CleaningUp);
            }
            for (_, file) in &uploaded {
                self.clean(file, report).await;
            }
        }
        if self.interrupted(report) {
            return;
        }

        if !report.failed.is_empty() {
            let failed = report.failed.len();
            self.enter(report, CyclePhase::Failed(FailureReason::Upload { failed }));
            return;
        }

        self.enter(report, CyclePhase::CleaningUp);
        self.tracker.advance(range);
    }

    async fn upload_leftovers(&self, leftovers: Vec<CapturedFile>, report: &mut CycleReport) {
        tracing::info!(leftovers = leftovers.len(), "Retrying files left by earlier cycles");
        let (uploaded, failed) = self.upload_all(leftovers).await;
        for (receipt, file) in uploaded {
            self.clean(&file, report).await;
            report.leftover_uploaded.push(receipt);
        }
        for failure in &failed {
            tracing::warn!(file = %failure.file.file_name, "Leftover file still not uploaded; keeping it on disk");
        }
        report.leftover_failed = failed;
    }

    /// Upload each file in turn, stopping early once cancelled.
    async fn upload_all(
        &self,
        files: Vec<CapturedFile>,
    ) -> (Vec<(UploadReceipt, CapturedFile)>, Vec<FailedUpload>) {
        let mut uploaded = Vec::new();
        let mut failed = Vec::new();
        for file in files {
            if self.cancel.is_cancelled() {
                break;
            }
            match upload_with_retry(self.uploader.as_ref(), &file, &self.retry, self.upload_timeout).await {
                UploadOutcome::Success(receipt) => uploaded.push((receipt, file)),
                outcome => failed.push(FailedUpload { file, outcome }),
            }
        }
        (uploaded, failed)
    }

    async fn clean(&self, file: &CapturedFile, report: &mut CycleReport) {
        if let Err(err) = self.cleanup.cleanup(file).await {
            tracing::warn!(error = %err, file = %file.file_name, "Cleanup failed");
            report.cleanup_failures.push(err);
        }
    }

    fn enter(&self, report: &mut CycleReport, phase: CyclePhase) {
        if report.phase != phase {
            tracing::debug!(from = %report.phase, to = %phase, "Cycle phase transition");
            report.phase = phase;
        }
    }

    fn interrupted(&self, report: &mut CycleReport) -> bool {
        if self.cancel.is_cancelled() {
            self.enter(report, CyclePhase::Failed(FailureReason::Interrupted));
            return true;
        }
        false
    }
}
