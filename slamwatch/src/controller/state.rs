//! Job state types.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::detection::DetectionSummary;
use crate::error::ErrorInfo;
use crate::progress::FrameEstimate;
use crate::upload::VideoAsset;

/// Lifecycle of the controller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobState {
    /// No job running; an asset may or may not be present.
    #[default]
    Idle,
    /// Start requested, waiting for the backend to acknowledge.
    Starting,
    /// The backend is processing; status is being polled.
    Processing,
    /// Processing finished successfully.
    Completed,
    /// Processing failed.
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Starting => "starting",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    /// Returns true while a job occupies the backend.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, JobState::Starting | JobState::Processing)
    }

    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub(crate) fn for_generation(generation: u64) -> Self {
        Self(format!("job-{}", generation))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The active job.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub generation: u64,
    pub state: JobState,
    /// Normalized progress; never decreases.
    pub progress_percent: f64,
    pub last_error: Option<ErrorInfo>,
    /// Latest count reported by the backend.
    pub detections_count: u64,
    pub started_at: DateTime<Utc>,
}

impl Job {
    pub(crate) fn new(generation: u64) -> Self {
        Self {
            id: JobId::for_generation(generation),
            generation,
            state: JobState::Processing,
            progress_percent: 0.0,
            last_error: None,
            detections_count: 0,
            started_at: Utc::now(),
        }
    }
}

/// Point-in-time copy of the controller's state.
#[derive(Debug, Clone)]
pub struct ControllerSnapshot {
    pub state: JobState,
    pub asset: Option<VideoAsset>,
    pub job: Option<Job>,
    pub last_error: Option<ErrorInfo>,
    pub summary: Option<Arc<DetectionSummary>>,
    /// Frame reached by the active job, once the frame total is known.
    pub frame: FrameEstimate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_flags() {
        assert!(JobState::Starting.is_in_flight());
        assert!(JobState::Processing.is_in_flight());
        assert!(!JobState::Idle.is_in_flight());
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Processing.is_terminal());
        assert_eq!(JobState::default(), JobState::Idle);
    }

    #[test]
    fn test_job_id_from_generation() {
        let job = Job::new(7);
        assert_eq!(job.id.as_str(), "job-7");
        assert_eq!(job.state, JobState::Processing);
        assert_eq!(job.progress_percent, 0.0);
    }
}
