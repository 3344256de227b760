#[cfg(feature = "storage-managed")]
use crate::ManagedCloudUploader;
#[cfg(feature = "storage-gcs")]
use crate::ObjectStorageUploader;
use crate::{UploadMode, Uploader};
use std::sync::Arc;
use vidlift_core::{ConfigError, CycleConfig};

/// Create the uploader selected by configuration.
///
/// Called once at startup; the returned uploader is used for every cycle.
/// `viam-cloud` mode reads the device credentials from the environment.
pub fn create_uploader(config: &CycleConfig) -> Result<Arc<dyn Uploader>, ConfigError> {
    match config.upload {
        #[cfg(feature = "storage-managed")]
        UploadMode::ViamCloud => {
            let credentials = vidlift_core::CloudCredentials::from_env()?;
            let uploader = ManagedCloudUploader::new(credentials)?;
            Ok(Arc::new(uploader))
        }

        #[cfg(not(feature = "storage-managed"))]
        UploadMode::ViamCloud => Err(ConfigError::Destination(
            "Managed cloud uploader not available (storage-managed feature not enabled)"
                .to_string(),
        )),

        #[cfg(feature = "storage-gcs")]
        UploadMode::GcpProject => {
            let target = config
                .object_storage
                .as_ref()
                .ok_or(ConfigError::MissingModeField {
                    field: "google_cloud_path",
                    mode: "gcp-project",
                })?;
            let uploader = ObjectStorageUploader::new(target)?;
            Ok(Arc::new(uploader))
        }

        #[cfg(not(feature = "storage-gcs"))]
        UploadMode::GcpProject => Err(ConfigError::Destination(
            "GCS uploader not available (storage-gcs feature not enabled)".to_string(),
        )),
    }
}
