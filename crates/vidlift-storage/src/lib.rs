//! vidlift storage library
//!
//! This crate provides the `Uploader` capability and its two destinations:
//! the device's managed cloud ingestion endpoint and a Google Cloud Storage
//! bucket. Exactly one uploader is built at startup by `create_uploader`.
//!
//! # Object key format
//!
//! Object keys are derived from the local file name only:
//!
//! - **No prefix**: `{file_name}`
//! - **With prefix**: `{prefix}/{file_name}`
//!
//! The same file therefore always maps to the same key, and re-uploading it
//! after a failed cycle overwrites the earlier object instead of duplicating it.

pub mod factory;
#[cfg(feature = "storage-gcs")]
pub mod gcs;
#[cfg(feature = "storage-gcs")]
pub(crate) mod keys;
#[cfg(feature = "storage-managed")]
pub mod managed;
pub mod traits;

// Re-export commonly used types
pub use factory::create_uploader;
#[cfg(feature = "storage-gcs")]
pub use gcs::{ObjectStorageUploader, ServiceAccountKey};
#[cfg(feature = "storage-managed")]
pub use managed::ManagedCloudUploader;
pub use traits::Uploader;
pub use vidlift_core::UploadMode;
