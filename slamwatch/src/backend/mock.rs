//! Scripted backend used by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::client::DetectionBackend;
use super::error::BackendError;
use super::types::{HealthResponse, ProcessingStatus, StartResponse, UploadResponse};
use crate::detection::{DetectionSummary, FrameDetection};
use crate::upload::VideoFile;

/// Build a status snapshot.
pub fn status(progress: f64, is_processing: bool) -> ProcessingStatus {
    ProcessingStatus {
        is_processing,
        progress,
        current_video: None,
        detections_count: (progress.max(0.0) / 10.0) as u64,
        slam_status: if is_processing { "active" } else { "inactive" }.to_string(),
    }
}

/// A small summary with two detections in one frame.
pub fn sample_summary() -> DetectionSummary {
    serde_json::from_value(serde_json::json!({
        "detections": [{
            "frame_number": 5,
            "timestamp": 0.2,
            "detections": [
                {"bbox": [0, 0, 10, 10], "confidence": 0.9, "class_id": 0, "class_name": "person"},
                {"bbox": [5, 5, 15, 25], "confidence": 0.6, "class_id": 1, "class_name": "vehicle"}
            ]
        }],
        "total_count": 2,
        "frames_processed": 40,
        "video": "clip.mp4"
    }))
    .unwrap()
}

#[derive(Default)]
struct Counters {
    health: AtomicUsize,
    upload: AtomicUsize,
    start: AtomicUsize,
    status: AtomicUsize,
    detections: AtomicUsize,
    frame: AtomicUsize,
    status_in_flight: AtomicUsize,
    status_max_in_flight: AtomicUsize,
}

/// Backend whose responses are scripted up front.
///
/// Status responses are consumed in order; once the script runs out the
/// last successful status repeats.
pub struct MockBackend {
    health: Mutex<Result<HealthResponse, BackendError>>,
    health_delay: Duration,
    uploads: Mutex<VecDeque<Result<UploadResponse, BackendError>>>,
    upload_delay: Duration,
    starts: Mutex<VecDeque<Result<StartResponse, BackendError>>>,
    start_delay: Duration,
    statuses: Mutex<VecDeque<Result<ProcessingStatus, BackendError>>>,
    last_status: Mutex<ProcessingStatus>,
    status_delay: Duration,
    summary: Mutex<Result<DetectionSummary, BackendError>>,
    summary_delay: Duration,
    frames: Mutex<HashMap<u64, FrameDetection>>,
    calls: Counters,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            health: Mutex::new(Ok(HealthResponse {
                message: "Drone CV/SLAM API".to_string(),
                status: "running".to_string(),
            })),
            health_delay: Duration::ZERO,
            uploads: Mutex::new(VecDeque::new()),
            upload_delay: Duration::ZERO,
            starts: Mutex::new(VecDeque::new()),
            start_delay: Duration::ZERO,
            statuses: Mutex::new(VecDeque::new()),
            last_status: Mutex::new(status(0.0, true)),
            status_delay: Duration::ZERO,
            summary: Mutex::new(Ok(sample_summary())),
            summary_delay: Duration::ZERO,
            frames: Mutex::new(HashMap::new()),
            calls: Counters::default(),
        }
    }

    pub fn with_statuses(self, statuses: Vec<Result<ProcessingStatus, BackendError>>) -> Self {
        self.statuses.lock().extend(statuses);
        self
    }

    pub fn with_progress(self, steps: &[f64]) -> Self {
        let last = steps.len().saturating_sub(1);
        let statuses = steps
            .iter()
            .enumerate()
            .map(|(i, &p)| Ok(status(p, i != last || p < 100.0)))
            .collect();
        self.with_statuses(statuses)
    }

    pub fn with_health_error(self, error: BackendError) -> Self {
        *self.health.lock() = Err(error);
        self
    }

    pub fn with_health_delay(mut self, delay: Duration) -> Self {
        self.health_delay = delay;
        self
    }

    pub fn with_upload_error(self, error: BackendError) -> Self {
        self.uploads.lock().push_back(Err(error));
        self
    }

    pub fn with_upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }

    pub fn with_start_error(self, error: BackendError) -> Self {
        self.starts.lock().push_back(Err(error));
        self
    }

    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = delay;
        self
    }

    pub fn with_summary(self, summary: DetectionSummary) -> Self {
        *self.summary.lock() = Ok(summary);
        self
    }

    pub fn with_summary_error(self, error: BackendError) -> Self {
        *self.summary.lock() = Err(error);
        self
    }

    pub fn with_summary_delay(mut self, delay: Duration) -> Self {
        self.summary_delay = delay;
        self
    }

    pub fn with_frame(self, frame: FrameDetection) -> Self {
        self.frames.lock().insert(frame.frame_number, frame);
        self
    }

    /// Make the next upload fail.
    pub fn fail_next_upload(&self, error: BackendError) {
        self.uploads.lock().push_back(Err(error));
    }

    /// Replace the summary after construction.
    pub fn set_summary(&self, summary: Result<DetectionSummary, BackendError>) {
        *self.summary.lock() = summary;
    }

    pub fn health_calls(&self) -> usize {
        self.calls.health.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.calls.upload.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.calls.start.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.calls.status.load(Ordering::SeqCst)
    }

    pub fn detections_calls(&self) -> usize {
        self.calls.detections.load(Ordering::SeqCst)
    }

    pub fn frame_calls(&self) -> usize {
        self.calls.frame.load(Ordering::SeqCst)
    }

    /// Highest number of status requests observed in flight at once.
    pub fn max_concurrent_status_requests(&self) -> usize {
        self.calls.status_max_in_flight.load(Ordering::SeqCst)
    }

    fn next_status(&self) -> Result<ProcessingStatus, BackendError> {
        let next = self.statuses.lock().pop_front();
        match next {
            Some(Ok(status)) => {
                *self.last_status.lock() = status.clone();
                Ok(status)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last_status.lock().clone()),
        }
    }
}

/// Decrements the in-flight counter even when the request is abandoned.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

impl DetectionBackend for MockBackend {
    async fn health(&self) -> Result<HealthResponse, BackendError> {
        self.calls.health.fetch_add(1, Ordering::SeqCst);
        pause(self.health_delay).await;
        self.health.lock().clone()
    }

    async fn upload_video(&self, file: &VideoFile) -> Result<UploadResponse, BackendError> {
        self.calls.upload.fetch_add(1, Ordering::SeqCst);
        pause(self.upload_delay).await;
        let scripted = self.uploads.lock().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(UploadResponse {
                filename: file.name().to_string(),
                size: file.size_bytes(),
                status: "ready_for_processing".to_string(),
                path: None,
                message: Some("Video uploaded successfully".to_string()),
            })
        })
    }

    async fn start_processing(&self) -> Result<StartResponse, BackendError> {
        self.calls.start.fetch_add(1, Ordering::SeqCst);
        pause(self.start_delay).await;
        let scripted = self.starts.lock().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(StartResponse {
                message: None,
                video: Some("clip.mp4".to_string()),
                status: "processing".to_string(),
                pipeline: Some("thermal detection".to_string()),
            })
        })
    }

    async fn processing_status(&self) -> Result<ProcessingStatus, BackendError> {
        self.calls.status.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.calls.status_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls
            .status_max_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);
        let _in_flight = InFlight(&self.calls.status_in_flight);

        pause(self.status_delay).await;
        self.next_status()
    }

    async fn detections(&self) -> Result<DetectionSummary, BackendError> {
        self.calls.detections.fetch_add(1, Ordering::SeqCst);
        pause(self.summary_delay).await;
        self.summary.lock().clone()
    }

    async fn frame_detections(&self, frame_number: u64) -> Result<FrameDetection, BackendError> {
        self.calls.frame.fetch_add(1, Ordering::SeqCst);
        let frame = self.frames.lock().get(&frame_number).cloned();
        frame.ok_or_else(|| BackendError::Status {
            status: 404,
            message: format!("No data found for frame {}", frame_number),
        })
    }
}
