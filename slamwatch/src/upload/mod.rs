//! Video upload.
//!
//! [`UploadCoordinator::submit`] validates a [`VideoFile`] locally and then
//! sends it to the backend. Validation failures never reach the network.

mod asset;
mod file;
mod validation;

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{BackendError, DetectionBackend};

pub use asset::VideoAsset;
pub use file::VideoFile;
pub use validation::{
    has_video_signature, validate, UploadConstraints, DEFAULT_ALLOWED_EXTENSIONS,
    DEFAULT_MAX_UPLOAD_BYTES,
};

/// Errors that can occur while uploading a video.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// The upload failed in transit.
    #[error("Upload failed: {0}")]
    Network(String),

    /// The file was rejected locally.
    #[error("Invalid upload: {0}")]
    Validation(String),

    /// The backend refused the file.
    #[error("Backend rejected upload (HTTP {status}): {message}")]
    Server { status: u16, message: String },
}

impl From<BackendError> for UploadError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Status { status, message } => UploadError::Server { status, message },
            BackendError::Timeout => UploadError::Network("request timed out".to_string()),
            BackendError::Transport(msg) => UploadError::Network(msg),
            BackendError::Decode(msg) => {
                UploadError::Network(format!("unexpected response from backend: {}", msg))
            }
        }
    }
}

/// Sends videos to the backend.
pub struct UploadCoordinator<B> {
    backend: Arc<B>,
}

impl<B: DetectionBackend> UploadCoordinator<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Validate and upload a file.
    pub async fn submit(
        &self,
        file: &VideoFile,
        constraints: &UploadConstraints,
    ) -> Result<VideoAsset, UploadError> {
        validate(file, constraints)?;

        info!(
            file = file.name(),
            size_bytes = file.size_bytes(),
            media_type = file.media_type(),
            "Uploading video"
        );

        let ack = self.backend.upload_video(file).await.map_err(|e| {
            warn!(file = file.name(), error = %e, "Upload failed");
            UploadError::from(e)
        })?;

        let asset = VideoAsset::from_ack(&ack, file.name(), file.size_bytes());
        info!(
            file = %asset.name,
            size_bytes = asset.size_bytes,
            status = %ack.status,
            "Video uploaded"
        );
        Ok(asset)
    }
}
