//! Events published by the job controller.

use std::sync::Arc;

use super::state::{JobId, JobState};
use crate::detection::DetectionSummary;
use crate::error::ErrorInfo;
use crate::progress::FrameEstimate;
use crate::upload::VideoAsset;

/// Progress of the active job, emitted for every status snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub job_id: JobId,
    pub generation: u64,
    /// Normalized progress; never decreases within a generation.
    pub progress_percent: f64,
    /// Progress exactly as the backend reported it.
    pub reported_percent: f64,
    pub frame: FrameEstimate,
    pub detections_count: u64,
    pub slam_status: String,
}

/// Notification sent to subscribers.
///
/// Events are delivered in the order the controller applied them.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// A new video replaced the current asset.
    AssetReplaced(VideoAsset),
    StateChanged { from: JobState, to: JobState },
    Progress(ProgressUpdate),
    /// The job completed and its summary was fetched.
    Completed(Arc<DetectionSummary>),
    /// The job, or the request that would have started it, failed.
    Failed(ErrorInfo),
    /// The job completed but its summary could not be fetched.
    SummaryUnavailable(ErrorInfo),
}
