//! Client for the video store resource that materializes recorded footage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use vidlift_core::constants::SAVE_TIMESTAMP_FORMAT;

const CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum VideoStoreError {
    #[error("Video store resource '{0}' not found")]
    NotFound(String),

    #[error("Video store unreachable: {0}")]
    Unreachable(String),

    #[error("Video store rejected save ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Asks the video store to write the footage for `[from, to)` to local files.
///
/// The returned document is whatever the store answered; it may name the
/// files it wrote.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn save(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Value, VideoStoreError>;

    /// Resource name, for logs and errors.
    fn name(&self) -> &str;
}

/// Format a timestamp the way the store's `save` command expects it.
pub fn format_save_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(SAVE_TIMESTAMP_FORMAT).to_string()
}

pub fn save_command(from: DateTime<Utc>, to: DateTime<Utc>) -> Value {
    json!({
        "command": "save",
        "from": format_save_timestamp(from),
        "to": format_save_timestamp(to),
    })
}

/// Video store reached over HTTP through the local machine API.
#[derive(Clone)]
pub struct HttpVideoStore {
    client: reqwest::Client,
    base_url: String,
    resource: String,
}

impl HttpVideoStore {
    pub fn new(base_url: impl Into<String>, resource: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            resource: resource.into(),
        })
    }

    fn command_url(&self) -> String {
        format!(
            "{}/resources/{}/do_command",
            self.base_url.trim_end_matches('/'),
            self.resource
        )
    }
}

#[async_trait]
impl VideoStore for HttpVideoStore {
    async fn save(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Value, VideoStoreError> {
        let command = save_command(from, to);
        tracing::debug!(resource = %self.resource, command = %command, "Sending save command");

        let response = self
            .client
            .post(self.command_url())
            .json(&command)
            .send()
            .await
            .map_err(|e| VideoStoreError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(VideoStoreError::NotFound(self.resource.clone()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VideoStoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| VideoStoreError::Unreachable(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    fn name(&self) -> &str {
        &self.resource
    }
}
