//! Periodic capture-and-upload cycle.
//!
//! `CycleScheduler` ticks at the configured interval and hands each tick to a
//! `CycleRunner`, which evaluates the schedule, asks the video store for the
//! next safe range, uploads what it wrote and deletes the uploaded files.

pub mod capture;
pub mod cleanup;
pub mod cycle;
pub mod retry;
pub mod scheduler;
pub mod video_store;

pub use capture::CaptureInvoker;
pub use cleanup::CleanupManager;
pub use cycle::{CyclePhase, CycleReport, CycleRunner, FailedUpload, FailureReason, SkipReason};
pub use retry::{upload_with_retry, RetryPolicy};
pub use scheduler::CycleScheduler;
pub use video_store::{HttpVideoStore, VideoStore, VideoStoreError};
