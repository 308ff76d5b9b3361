//! HTTP implementation of [`DetectionBackend`] using reqwest.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, trace, warn};

use super::client::DetectionBackend;
use super::error::BackendError;
use super::types::{HealthResponse, ProcessingStatus, StartResponse, UploadResponse};
use crate::detection::{DetectionSummary, FrameDetection};
use crate::upload::VideoFile;

/// Default backend address.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`HttpBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// Base URL, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Timeout applied to every request.
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Detection backend reached over HTTP.
///
/// Holds a pooled `reqwest::Client`; cloning shares the pool.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for the configured backend.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("slamwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<T, BackendError> {
        trace!(url = url, "HTTP request starting");

        let response = match request.send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(BackendError::from(e));
            }
        };

        let status = response.status();
        let body = response.bytes().await.map_err(BackendError::from)?;

        if !status.is_success() {
            let message = error_message(&body);
            warn!(
                url = url,
                status = status.as_u16(),
                message = %message,
                "HTTP error status"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| {
            warn!(url = url, error = %e, "Unexpected response body");
            BackendError::Decode(e.to_string())
        })
    }
}

/// Pull a human-readable message out of an error body.
///
/// The backend reports errors as `{"detail": ...}`; anything else is passed
/// through as text.
fn error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }

    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    }
}

impl DetectionBackend for HttpBackend {
    async fn health(&self) -> Result<HealthResponse, BackendError> {
        let url = self.url("/");
        self.send_json(self.client.get(&url), &url).await
    }

    async fn upload_video(&self, file: &VideoFile) -> Result<UploadResponse, BackendError> {
        let url = self.url("/upload-video");
        let part = reqwest::multipart::Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.media_type())
            .map_err(|e| BackendError::Transport(format!("Invalid media type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        debug!(
            url = %url,
            file = file.name(),
            size_bytes = file.size_bytes(),
            "Uploading video"
        );
        self.send_json(self.client.post(&url).multipart(form), &url)
            .await
    }

    async fn start_processing(&self) -> Result<StartResponse, BackendError> {
        let url = self.url("/start-processing");
        self.send_json(self.client.post(&url), &url).await
    }

    async fn processing_status(&self) -> Result<ProcessingStatus, BackendError> {
        let url = self.url("/processing-status");
        self.send_json(self.client.get(&url), &url).await
    }

    async fn detections(&self) -> Result<DetectionSummary, BackendError> {
        let url = self.url("/detections");
        self.send_json(self.client.get(&url), &url).await
    }

    async fn frame_detections(&self, frame_number: u64) -> Result<FrameDetection, BackendError> {
        let url = self.url(&format!("/detections/frame/{}", frame_number));
        self.send_json(self.client.get(&url), &url).await
    }
}
