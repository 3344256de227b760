//! Uploader abstraction trait

use crate::UploadMode;
use async_trait::async_trait;
use vidlift_core::{CapturedFile, UploadError, UploadReceipt};

/// A destination for captured files.
///
/// Implementations transfer the full content of one local file and return only
/// once the destination has acknowledged durable receipt. Errors are classified
/// as recoverable (worth retrying within the cycle) or fatal.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, file: &CapturedFile) -> Result<UploadReceipt, UploadError>;

    /// The destination kind this uploader writes to.
    fn upload_mode(&self) -> UploadMode;
}
