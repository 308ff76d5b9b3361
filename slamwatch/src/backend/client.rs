//! Backend client trait.

use std::future::Future;

use super::error::BackendError;
use super::types::{HealthResponse, ProcessingStatus, StartResponse, UploadResponse};
use crate::detection::{DetectionSummary, FrameDetection};
use crate::upload::VideoFile;

/// Operations offered by the detection backend.
///
/// The backend holds a single current video and runs at most one processing
/// job at a time. Implementations must be cheap to share across tasks.
pub trait DetectionBackend: Send + Sync {
    /// Liveness check (`GET /`).
    fn health(&self) -> impl Future<Output = Result<HealthResponse, BackendError>> + Send;

    /// Upload a video, replacing the backend's current one.
    fn upload_video(
        &self,
        file: &VideoFile,
    ) -> impl Future<Output = Result<UploadResponse, BackendError>> + Send;

    /// Start processing the current video.
    fn start_processing(&self)
        -> impl Future<Output = Result<StartResponse, BackendError>> + Send;

    /// Snapshot of the running (or last) job.
    fn processing_status(
        &self,
    ) -> impl Future<Output = Result<ProcessingStatus, BackendError>> + Send;

    /// All detections recorded for the last processed video.
    fn detections(&self) -> impl Future<Output = Result<DetectionSummary, BackendError>> + Send;

    /// Detections for one frame. A frame without detections is a 404.
    fn frame_detections(
        &self,
        frame_number: u64,
    ) -> impl Future<Output = Result<FrameDetection, BackendError>> + Send;
}
