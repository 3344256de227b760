//! In-cycle upload retries with capped exponential backoff.

use std::time::Duration;
use vidlift_core::constants::MAX_RETRY_DELAY_SECS;
use vidlift_core::{CapturedFile, CycleTuning, UploadError, UploadOutcome};
use vidlift_storage::Uploader;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_tuning(&CycleTuning::default())
    }
}

impl RetryPolicy {
    pub fn from_tuning(tuning: &CycleTuning) -> Self {
        Self {
            max_attempts: tuning.upload_max_attempts.max(1),
            base_delay: tuning.retry_base_delay,
            max_delay: Duration::from_secs(MAX_RETRY_DELAY_SECS),
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(exponent))
            .min(self.max_delay)
    }
}

/// Upload `file`, retrying recoverable failures up to `policy.max_attempts`.
///
/// Each attempt is bounded by `timeout`; a timed out attempt counts as
/// recoverable. Fatal errors stop immediately.
#[tracing::instrument(skip(uploader, file, policy), fields(file = %file.file_name, mode = %uploader.upload_mode()))]
pub async fn upload_with_retry(
    uploader: &dyn Uploader,
    file: &CapturedFile,
    policy: &RetryPolicy,
    timeout: Duration,
) -> UploadOutcome {
    let mut attempt = 1;
    loop {
        let result = match tokio::time::timeout(timeout, uploader.upload(file)).await {
            Ok(result) => result,
            Err(_) => Err(UploadError::Recoverable(format!(
                "upload timed out after {:?}",
                timeout
            ))),
        };

        match result {
            Ok(receipt) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Upload succeeded after retry");
                }
                return UploadOutcome::Success(receipt);
            }
            Err(error) if !error.is_recoverable() => {
                tracing::error!(attempt, error = %error, "Upload failed with fatal error, will not retry");
                return UploadOutcome::FatalFailure(error);
            }
            Err(error) if attempt >= policy.max_attempts => {
                tracing::error!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %error,
                    "Upload failed after max attempts"
                );
                return UploadOutcome::RecoverableFailure {
                    attempts: attempt,
                    error,
                };
            }
            Err(error) => {
                let delay = policy.backoff(attempt);
                tracing::warn!(
                    attempt,
                    backoff_ms = delay.as_millis() as u64,
                    error = %error,
                    "Upload attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
