//! Job-level error taxonomy.
//!
//! Component errors ([`BackendError`], [`UploadError`], [`PollError`],
//! [`FetchError`]) are converted into a [`JobError`] at the controller
//! boundary. Every `JobError` is recoverable: the controller always returns
//! to a state from which the user can upload or start again.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::backend::BackendError;
use crate::connectivity::UnavailableReason;
use crate::poller::PollError;
use crate::results::FetchError;
use crate::upload::UploadError;

/// Errors surfaced by the job controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// A request failed in transit.
    #[error("Network error: {0}")]
    Network(String),

    /// Input rejected before anything was sent.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The backend refused the request.
    #[error("Backend rejected request (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// The connectivity probe failed; nothing was sent.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(UnavailableReason),

    /// The backend stopped processing without completing.
    #[error("Processing failed: {0}")]
    Processing(String),

    /// The operation is not allowed in the current state.
    #[error("Not allowed: {0}")]
    Precondition(Precondition),
}

/// Guard that blocked an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("no video has been uploaded")]
    NoAsset,

    #[error("a job is already starting or processing")]
    JobInFlight,

    #[error("the current video was already processed; upload a video to run again")]
    AlreadyCompleted,

    #[error("results are only available once processing completes")]
    NotCompleted,

    #[error("no job has been started for the current video")]
    NoJob,

    #[error("the request was superseded by a newer one")]
    Superseded,
}

impl JobError {
    /// Short machine-friendly label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::Network(_) => "network",
            JobError::Validation(_) => "validation",
            JobError::Server { .. } => "server",
            JobError::BackendUnavailable(_) => "backend_unavailable",
            JobError::Processing(_) => "processing",
            JobError::Precondition(_) => "precondition",
        }
    }
}

impl From<Precondition> for JobError {
    fn from(p: Precondition) -> Self {
        JobError::Precondition(p)
    }
}

impl From<BackendError> for JobError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Status { status, message } => JobError::Server { status, message },
            BackendError::Timeout => JobError::Network("request timed out".to_string()),
            BackendError::Transport(msg) => JobError::Network(msg),
            BackendError::Decode(msg) => {
                JobError::Network(format!("unexpected response from backend: {}", msg))
            }
        }
    }
}

impl From<UploadError> for JobError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Validation(msg) => JobError::Validation(msg),
            UploadError::Network(msg) => JobError::Network(msg),
            UploadError::Server { status, message } => JobError::Server { status, message },
        }
    }
}

impl From<PollError> for JobError {
    fn from(e: PollError) -> Self {
        match e {
            PollError::Network(e) => JobError::from(e),
            PollError::BackendReportedFailure(msg) => JobError::Processing(msg),
            PollError::StaleResultDiscarded => JobError::Precondition(Precondition::Superseded),
        }
    }
}

impl From<FetchError> for JobError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Backend(e) => JobError::from(e),
            FetchError::FrameNotFound(n) => JobError::Server {
                status: 404,
                message: format!("no detections recorded for frame {}", n),
            },
            FetchError::StaleResultDiscarded => JobError::Precondition(Precondition::Superseded),
        }
    }
}

/// An error together with the time it was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub error: JobError,
    pub occurred_at: DateTime<Utc>,
}

impl ErrorInfo {
    pub fn now(error: JobError) -> Self {
        Self {
            error,
            occurred_at: Utc::now(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {})", self.error, self.occurred_at.format("%H:%M:%S"))
    }
}
