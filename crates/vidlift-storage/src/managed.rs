use crate::traits::Uploader;
use crate::UploadMode;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use vidlift_core::{CapturedFile, CloudCredentials, ConfigError, UploadError, UploadReceipt};

const INGEST_PATH: &str = "/datasync/v1/files";
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct IngestResponse {
    #[serde(default)]
    file_id: Option<String>,
}

/// Uploader for the device's managed cloud ingestion endpoint.
///
/// Authentication uses the API key pair the device was provisioned with; no
/// destination address is configured by the operator.
#[derive(Clone)]
pub struct ManagedCloudUploader {
    client: reqwest::Client,
    credentials: CloudCredentials,
}

impl ManagedCloudUploader {
    pub fn new(credentials: CloudCredentials) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ConfigError::Destination(e.to_string()))?;

        tracing::info!(
            api_url = %credentials.api_url,
            api_key_id = %credentials.api_key_id,
            part_id = ?credentials.part_id,
            "Managed cloud uploader initialized"
        );

        Ok(Self {
            client,
            credentials,
        })
    }

    fn ingest_url(&self) -> String {
        format!(
            "{}{}",
            self.credentials.api_url.trim_end_matches('/'),
            INGEST_PATH
        )
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    match file_name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()) {
        Some(ext) if ext == "mp4" => "video/mp4",
        Some(ext) if ext == "mkv" => "video/x-matroska",
        Some(ext) if ext == "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// Timeouts, throttling, server errors and expired sessions are transient;
/// any other rejection is permanent.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> UploadError {
    let message = format!("ingestion endpoint returned {}: {}", status, body.trim());
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::UNAUTHORIZED
    {
        UploadError::Recoverable(message)
    } else {
        UploadError::Fatal(message)
    }
}

pub(crate) fn classify_transport(err: &reqwest::Error) -> UploadError {
    if err.is_builder() {
        UploadError::Fatal(err.to_string())
    } else {
        UploadError::Recoverable(err.to_string())
    }
}

#[async_trait]
impl Uploader for ManagedCloudUploader {
    async fn upload(&self, file: &CapturedFile) -> Result<UploadReceipt, UploadError> {
        let start = std::time::Instant::now();
        let data = tokio::fs::read(&file.path).await?;
        let size = data.len() as u64;

        let mut query: Vec<(&str, &str)> = vec![("file_name", file.file_name.as_str())];
        if let Some(ref part_id) = self.credentials.part_id {
            query.push(("part_id", part_id.as_str()));
        }

        let response = self
            .client
            .post(self.ingest_url())
            .header("key_id", &self.credentials.api_key_id)
            .header("key", &self.credentials.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type_for(&file.file_name))
            .query(&query)
            .body(data)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    file = %file.file_name,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Managed cloud upload request failed"
                );
                classify_transport(&e)
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            let classified = classify_status(status, &body);
            tracing::error!(
                status = %status,
                file = %file.file_name,
                size_bytes = size,
                recoverable = classified.is_recoverable(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Managed cloud upload rejected"
            );
            return Err(classified);
        }

        let file_id = serde_json::from_str::<IngestResponse>(&body)
            .ok()
            .and_then(|r| r.file_id);

        tracing::info!(
            file = %file.file_name,
            file_id = ?file_id,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Managed cloud upload successful"
        );

        Ok(UploadReceipt {
            file_name: file.file_name.clone(),
            location: file_id.unwrap_or_else(|| file.file_name.clone()),
            size_bytes: size,
        })
    }

    fn upload_mode(&self) -> UploadMode {
        UploadMode::ViamCloud
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn credentials(api_url: String) -> CloudCredentials {
        CloudCredentials {
            api_url,
            api_key_id: "key-id".to_string(),
            api_key: "key-secret".to_string(),
            part_id: Some("part-1".to_string()),
        }
    }

    async fn clip(dir: &tempfile::TempDir) -> CapturedFile {
        let path = dir.path().join("clip_1.mp4");
        tokio::fs::write(&path, b"frames").await.unwrap();
        CapturedFile::from_path(path).unwrap()
    }

    #[tokio::test]
    async fn posts_file_with_device_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", INGEST_PATH)
            .match_header("key_id", "key-id")
            .match_header("key", "key-secret")
            .match_header("content-type", "video/mp4")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("file_name".into(), "clip_1.mp4".into()),
                Matcher::UrlEncoded("part_id".into(), "part-1".into()),
            ]))
            .match_body("frames")
            .with_status(200)
            .with_body(r#"{"file_id": "f-123"}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let uploader = ManagedCloudUploader::new(credentials(server.url())).unwrap();
        let receipt = uploader.upload(&clip(&dir).await).await.unwrap();

        mock.assert_async().await;
        assert_eq!(receipt.location, "f-123");
        assert_eq!(receipt.size_bytes, 6);
    }

    #[tokio::test]
    async fn server_errors_are_recoverable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", INGEST_PATH)
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let uploader = ManagedCloudUploader::new(credentials(server.url())).unwrap();
        let err = uploader.upload(&clip(&dir).await).await.unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn forbidden_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", INGEST_PATH)
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("api key revoked")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let uploader = ManagedCloudUploader::new(credentials(server.url())).unwrap();
        let err = uploader.upload(&clip(&dir).await).await.unwrap_err();
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("api key revoked"));
    }

    #[test]
    fn status_classification() {
        assert!(classify_status(StatusCode::INTERNAL_SERVER_ERROR, "").is_recoverable());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "").is_recoverable());
        assert!(classify_status(StatusCode::UNAUTHORIZED, "").is_recoverable());
        assert!(!classify_status(StatusCode::NOT_FOUND, "").is_recoverable());
        assert!(!classify_status(StatusCode::BAD_REQUEST, "").is_recoverable());
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("a.MP4"), "video/mp4");
        assert_eq!(content_type_for("a.mkv"), "video/x-matroska");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
