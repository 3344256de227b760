use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vidlift_core::CycleConfig;
use vidlift_storage::create_uploader;
use vidlift_worker::{CycleRunner, CycleScheduler, HttpVideoStore};

pub fn load_config(path: &Path) -> Result<CycleConfig> {
    CycleConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Build the uploader and video store client, then start the scheduler.
///
/// Credentials and the destination are validated here, so a bad service
/// account or missing API key stops the service before the first tick.
pub fn initialize_service(config: &CycleConfig, cancel: CancellationToken) -> Result<CycleScheduler> {
    let uploader = create_uploader(config).context("Failed to initialize upload destination")?;

    let store = HttpVideoStore::new(&config.video_store_url, &config.video_store)
        .context("Failed to build video store client")?;

    tracing::info!(
        upload = %uploader.upload_mode(),
        video_store = %config.video_store,
        video_store_url = %config.video_store_url,
        dependencies = ?config.dependencies(),
        "Upload destination and video store ready"
    );

    let runner = CycleRunner::new(config, Arc::new(store), uploader);
    Ok(CycleScheduler::start(runner, config.interval, cancel))
}
