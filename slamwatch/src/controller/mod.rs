//! Job controller.
//!
//! [`JobController`] owns the single active job and is the only component
//! that mutates job state. It coordinates upload, connectivity probing,
//! status polling and result retrieval, and publishes every change on a
//! broadcast channel.
//!
//! # State machine
//!
//! ```text
//!             submit_video (any state)
//!        ┌──────────────────────────────────┐
//!        ▼                                  │
//!      Idle ──start()──► Starting ──ack──► Processing ──done──► Completed
//!        ▲                  │                  │
//!        │   reject/network │                  └──failed──► Failed
//!        └──────────────────┘                                  │
//!        ▲                                                     │
//!        └──────────────── start() (re-run) ───────────────────┘
//! ```
//!
//! # Generations
//!
//! Each `start()` and each accepted upload advances the generation. The
//! poll task and result fetches carry the token of the generation they
//! were started for; once superseded, their results are dropped.
//!
//! # Locking
//!
//! Controller state sits behind a `parking_lot::Mutex` that is never held
//! across an `.await`. Events are sent while the lock is held so that the
//! event order always matches the order state changes were applied.

mod config;
mod events;
mod state;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use crate::backend::{DetectionBackend, ProcessingStatus};
use crate::connectivity::{Connectivity, ConnectivityMonitor};
use crate::detection::{DetectionSummary, FrameDetection};
use crate::error::{ErrorInfo, JobError, Precondition};
use crate::generation::{GenerationCounter, GenerationToken};
use crate::poller::{PollError, StatusPoller};
use crate::progress::{estimate_frame, MonotonicProgress};
use crate::results::{FetchError, ResultAggregator};
use crate::upload::{UploadCoordinator, UploadError, VideoAsset, VideoFile};

pub use config::{ControllerConfig, DEFAULT_EVENT_CAPACITY};
pub use events::{JobEvent, ProgressUpdate};
pub use state::{ControllerSnapshot, Job, JobId, JobState};

/// Mutable controller state.
#[derive(Default)]
struct ControllerState {
    phase: JobState,
    asset: Option<VideoAsset>,
    job: Option<Job>,
    /// Token of the generation the current job runs under.
    token: Option<GenerationToken>,
    last_error: Option<ErrorInfo>,
    progress: MonotonicProgress,
    /// Known once the summary has been fetched.
    total_frames: Option<u64>,
    summary: Option<Arc<DetectionSummary>>,
    /// A `start()` call is between its guard check and its outcome.
    start_pending: bool,
}

struct Inner<B> {
    config: ControllerConfig,
    backend: Arc<B>,
    connectivity: ConnectivityMonitor<B>,
    uploader: UploadCoordinator<B>,
    poller: StatusPoller<B>,
    results: ResultAggregator<B>,
    generations: GenerationCounter,
    state: Mutex<ControllerState>,
    events: broadcast::Sender<JobEvent>,
}

/// Drives one video through upload, processing and result retrieval.
///
/// Cheap to clone; clones share the same job.
pub struct JobController<B> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for JobController<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: DetectionBackend + 'static> JobController<B> {
    /// Create a controller for `backend`.
    pub fn new(backend: Arc<B>, config: ControllerConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        let inner = Inner {
            connectivity: ConnectivityMonitor::new(
                Arc::clone(&backend),
                config.connectivity_timeout,
            ),
            uploader: UploadCoordinator::new(Arc::clone(&backend)),
            poller: StatusPoller::new(Arc::clone(&backend), config.poll_interval),
            results: ResultAggregator::new(Arc::clone(&backend)),
            backend,
            config,
            generations: GenerationCounter::new(),
            state: Mutex::new(ControllerState::default()),
            events,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Subscribe to job events.
    ///
    /// Only events sent after subscribing are received.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.inner.events.subscribe()
    }

    /// Current job state.
    pub fn state(&self) -> JobState {
        self.inner.state.lock().phase
    }

    /// Copy of the full controller state.
    pub fn snapshot(&self) -> ControllerSnapshot {
        let state = self.inner.state.lock();
        ControllerSnapshot {
            state: state.phase,
            asset: state.asset.clone(),
            job: state.job.clone(),
            last_error: state.last_error.clone(),
            summary: state.summary.clone(),
            frame: estimate_frame(state.progress.current(), state.total_frames),
        }
    }

    /// Probe backend reachability without changing state.
    pub async fn probe(&self) -> Connectivity {
        self.inner.connectivity.probe().await
    }

    /// Upload a video and make it the current asset.
    ///
    /// On success any running job is superseded and the state returns to
    /// `Idle`. Local validation failures change nothing.
    pub async fn submit_video(&self, file: &VideoFile) -> Result<VideoAsset, JobError> {
        let inner = &self.inner;

        match inner.uploader.submit(file, &inner.config.upload).await {
            Ok(asset) => {
                inner.accept_asset(asset.clone());
                inner.results.invalidate().await;
                Ok(asset)
            }
            Err(UploadError::Validation(reason)) => {
                debug!(file = file.name(), reason = %reason, "Upload rejected locally");
                Err(JobError::Validation(reason))
            }
            Err(e) => {
                let error = JobError::from(e);
                inner.record_upload_failure(&error);
                Err(error)
            }
        }
    }

    /// Start processing the current asset.
    ///
    /// Requires an asset, no job starting or processing, and a reachable
    /// backend. On acknowledgement the state becomes `Processing` and a
    /// poll task follows the job to completion.
    pub async fn start(&self) -> Result<JobId, JobError> {
        let inner = &self.inner;

        let reserved_at = {
            let mut state = inner.state.lock();
            if let Err(reason) = check_can_start(&state) {
                debug!(state = %state.phase, reason = %reason, "Start rejected");
                return Err(reason.into());
            }
            state.start_pending = true;
            inner.generations.current()
        };
        let mut pending = PendingStart::new(inner);

        if let Connectivity::Unavailable(reason) = inner.connectivity.probe().await {
            let error = JobError::BackendUnavailable(reason);
            inner.state.lock().last_error = Some(ErrorInfo::now(error.clone()));
            return Err(error);
        }

        let token = {
            let mut state = inner.state.lock();
            if inner.generations.current() != reserved_at {
                return Err(Precondition::Superseded.into());
            }

            let token = inner.generations.advance();
            state.token = Some(token.clone());
            state.job = None;
            state.summary = None;
            state.total_frames = None;
            state.last_error = None;
            state.progress.reset();
            inner.transition(&mut state, JobState::Starting);
            pending.token = Some(token.clone());
            token
        };

        info!(generation = token.id(), "Requesting processing start");
        let response = inner.backend.start_processing().await;

        let mut state = inner.state.lock();
        if !token.is_current() {
            debug!(generation = token.id(), "Start completed for superseded generation");
            return Err(Precondition::Superseded.into());
        }

        match response {
            Ok(ack) => {
                let job = Job::new(token.id());
                let id = job.id.clone();
                state.job = Some(job);
                inner.transition(&mut state, JobState::Processing);
                drop(state);

                info!(
                    job_id = %id,
                    video = ack.video.as_deref().unwrap_or("-"),
                    pipeline = ack.pipeline.as_deref().unwrap_or("-"),
                    "Processing started"
                );
                tokio::spawn(Arc::clone(inner).run_job(token));
                Ok(id)
            }
            Err(e) => {
                let error = JobError::from(e);
                let info = ErrorInfo::now(error.clone());
                warn!(error = %error, "Backend refused to start processing");

                state.token = None;
                state.last_error = Some(info.clone());
                inner.transition(&mut state, JobState::Idle);
                inner.emit(JobEvent::Failed(info));
                Err(error)
            }
        }
    }

    /// Summary of the completed job.
    ///
    /// Served from cache once fetched; retries the fetch if the automatic
    /// one after completion failed.
    pub async fn summary(&self) -> Result<Arc<DetectionSummary>, JobError> {
        let token = {
            let state = self.inner.state.lock();
            if state.phase != JobState::Completed {
                return Err(Precondition::NotCompleted.into());
            }
            if let Some(summary) = &state.summary {
                return Ok(Arc::clone(summary));
            }
            state
                .token
                .clone()
                .ok_or(JobError::Precondition(Precondition::NoJob))?
        };

        let summary = self.inner.results.fetch_summary(&token).await?;
        self.inner.store_summary(&token, Arc::clone(&summary));
        Ok(summary)
    }

    /// Detections recorded for one frame of the current job.
    pub async fn frame_detections(&self, frame_number: u64) -> Result<FrameDetection, JobError> {
        let token = {
            let state = self.inner.state.lock();
            match (&state.token, state.job.is_some()) {
                (Some(token), true) => token.clone(),
                _ => return Err(Precondition::NoJob.into()),
            }
        };

        Ok(self.inner.results.fetch_frame(&token, frame_number).await?)
    }
}

/// Releases the start reservation when `start()` returns or is dropped.
///
/// A `start()` dropped while waiting for the backend's acknowledgement
/// leaves its generation in `Starting` with no poll task; the guard
/// returns that generation to `Idle`.
struct PendingStart<'a, B> {
    inner: &'a Inner<B>,
    token: Option<GenerationToken>,
}

impl<'a, B> PendingStart<'a, B> {
    fn new(inner: &'a Inner<B>) -> Self {
        Self { inner, token: None }
    }
}

impl<B> Drop for PendingStart<'_, B> {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        state.start_pending = false;

        let Some(token) = self.token.take() else {
            return;
        };
        let owns_state = state.token.as_ref().map(GenerationToken::id) == Some(token.id());
        if owns_state && state.phase == JobState::Starting {
            debug!(generation = token.id(), "Start abandoned before acknowledgement");
            state.token = None;
            self.inner.transition(&mut state, JobState::Idle);
        }
    }
}

fn check_can_start(state: &ControllerState) -> Result<(), Precondition> {
    if state.asset.is_none() {
        return Err(Precondition::NoAsset);
    }
    if state.start_pending || state.phase.is_in_flight() {
        return Err(Precondition::JobInFlight);
    }
    if state.phase == JobState::Completed {
        return Err(Precondition::AlreadyCompleted);
    }
    Ok(())
}

impl<B> Inner<B> {
    fn emit(&self, event: JobEvent) {
        if self.events.send(event).is_err() {
            trace!("No event subscribers");
        }
    }

    fn transition(&self, state: &mut ControllerState, to: JobState) {
        let from = state.phase;
        if from == to {
            return;
        }
        state.phase = to;
        info!(from = %from, to = %to, "Job state changed");
        self.emit(JobEvent::StateChanged { from, to });
    }
}

impl<B: DetectionBackend + 'static> Inner<B> {
    fn accept_asset(&self, asset: VideoAsset) {
        let mut state = self.state.lock();

        let generation = self.generations.advance().id();
        if let Some(old) = state.token.take() {
            debug!(
                superseded = old.id(),
                generation, "Active job superseded by new upload"
            );
        }

        state.asset = Some(asset.clone());
        state.job = None;
        state.last_error = None;
        state.summary = None;
        state.total_frames = None;
        state.progress.reset();

        self.emit(JobEvent::AssetReplaced(asset));
        self.transition(&mut state, JobState::Idle);
    }

    /// Record a failed upload.
    ///
    /// The previous asset stays current, so the job and summary that
    /// belong to it are left as they are.
    fn record_upload_failure(&self, error: &JobError) {
        let mut state = self.state.lock();
        warn!(error = %error, state = %state.phase, "Upload failed");
        state.last_error = Some(ErrorInfo::now(error.clone()));

        if state.phase != JobState::Idle || state.start_pending {
            debug!(state = %state.phase, "Leaving current job untouched after failed upload");
        }
    }

    async fn run_job(self: Arc<Self>, token: GenerationToken) {
        let outcome = self
            .poller
            .poll(&token, |status| self.apply_snapshot(&token, status))
            .await;

        match outcome {
            Ok(_) => self.complete(&token).await,
            Err(PollError::StaleResultDiscarded) => {
                debug!(generation = token.id(), "Poll result of superseded job discarded")
            }
            Err(e) => self.fail(&token, JobError::from(e)),
        }
    }

    fn apply_snapshot(&self, token: &GenerationToken, status: &ProcessingStatus) {
        let mut guard = self.state.lock();
        if !token.is_current() {
            return;
        }
        let state = &mut *guard;

        let percent = state.progress.observe(status.progress);
        if status.progress < percent {
            debug!(
                reported = status.progress,
                held = percent,
                "Backend progress regressed; holding previous maximum"
            );
        }

        if let (Some(asset), Some(current)) = (state.asset.as_mut(), &status.current_video) {
            if asset.refresh_from(current) {
                debug!(path = %asset.backend_path, "Backend path of current video updated");
            }
        }

        let Some(job) = state.job.as_mut() else {
            return;
        };
        job.progress_percent = percent;
        job.detections_count = status.detections_count;

        let update = ProgressUpdate {
            job_id: job.id.clone(),
            generation: token.id(),
            progress_percent: percent,
            reported_percent: status.progress,
            frame: estimate_frame(percent, state.total_frames),
            detections_count: status.detections_count,
            slam_status: status.slam_status.clone(),
        };
        trace!(
            generation = token.id(),
            progress = percent,
            detections = status.detections_count,
            "Progress update"
        );
        self.emit(JobEvent::Progress(update));
    }

    async fn complete(&self, token: &GenerationToken) {
        {
            let mut state = self.state.lock();
            if !token.is_current() {
                return;
            }
            if let Some(job) = state.job.as_mut() {
                job.state = JobState::Completed;
            }
            self.transition(&mut state, JobState::Completed);
        }

        match self.results.fetch_summary(token).await {
            Ok(summary) => self.store_summary(token, summary),
            Err(FetchError::StaleResultDiscarded) => {
                debug!(generation = token.id(), "Summary of superseded job discarded")
            }
            Err(e) => {
                let info = ErrorInfo::now(JobError::from(e));
                let mut state = self.state.lock();
                if !token.is_current() {
                    return;
                }
                warn!(error = %info.error, "Job completed but summary is unavailable");
                state.last_error = Some(info.clone());
                if let Some(job) = state.job.as_mut() {
                    job.last_error = Some(info.clone());
                }
                self.emit(JobEvent::SummaryUnavailable(info));
            }
        }
    }

    fn store_summary(&self, token: &GenerationToken, summary: Arc<DetectionSummary>) {
        let mut state = self.state.lock();
        if !token.is_current() || state.summary.is_some() {
            return;
        }

        if summary.frames_processed > 0 {
            state.total_frames = Some(summary.frames_processed);
        }
        state.last_error = None;
        if let Some(job) = state.job.as_mut() {
            job.last_error = None;
        }
        state.summary = Some(Arc::clone(&summary));

        info!(
            generation = token.id(),
            total_detections = summary.total_count,
            frames_processed = summary.frames_processed,
            "Job results available"
        );
        self.emit(JobEvent::Completed(summary));
    }

    fn fail(&self, token: &GenerationToken, error: JobError) {
        let mut state = self.state.lock();
        if !token.is_current() {
            return;
        }

        let info = ErrorInfo::now(error);
        warn!(kind = info.error.kind(), error = %info.error, "Job failed");

        state.last_error = Some(info.clone());
        if let Some(job) = state.job.as_mut() {
            job.state = JobState::Failed;
            job.last_error = Some(info.clone());
        }
        self.transition(&mut state, JobState::Failed);
        self.emit(JobEvent::Failed(info));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{status, MockBackend};
    use crate::backend::BackendError;
    use crate::connectivity::UnavailableReason;
    use crate::progress::FrameEstimate;
    use std::time::Duration;

    fn video(name: &str) -> VideoFile {
        VideoFile::from_bytes(name, b"\x00\x00\x00\x18ftypmp42 payload".to_vec())
    }

    fn controller(backend: MockBackend) -> (JobController<MockBackend>, Arc<MockBackend>) {
        let backend = Arc::new(backend);
        let controller = JobController::new(Arc::clone(&backend), ControllerConfig::default());
        (controller, backend)
    }

    async fn next_event(rx: &mut broadcast::Receiver<JobEvent>) -> JobEvent {
        tokio::time::timeout(Duration::from_secs(120), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    async fn wait_for(
        rx: &mut broadcast::Receiver<JobEvent>,
        matches: impl Fn(&JobEvent) -> bool,
    ) -> JobEvent {
        loop {
            let event = next_event(rx).await;
            if matches(&event) {
                return event;
            }
        }
    }

    #[tokio::test]
    async fn test_start_without_asset_rejected() {
        let (controller, backend) = controller(MockBackend::new());

        let err = controller.start().await.unwrap_err();

        assert_eq!(err, JobError::Precondition(Precondition::NoAsset));
        assert_eq!(controller.state(), JobState::Idle);
        assert_eq!(backend.health_calls(), 0);
        assert_eq!(backend.start_calls(), 0);
    }

    #[tokio::test]
    async fn test_submit_video_sets_asset() {
        let (controller, _) = controller(MockBackend::new());
        let mut events = controller.subscribe();

        let asset = controller.submit_video(&video("clip.mp4")).await.unwrap();

        assert_eq!(asset.name, "clip.mp4");
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, JobState::Idle);
        assert_eq!(snapshot.asset, Some(asset));
        assert!(snapshot.job.is_none());
        assert!(matches!(next_event(&mut events).await, JobEvent::AssetReplaced(_)));
    }

    #[tokio::test]
    async fn test_invalid_video_changes_nothing() {
        let (controller, backend) = controller(MockBackend::new());

        let err = controller
            .submit_video(&VideoFile::from_bytes("clip.mp4", vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::Validation(_)));
        assert_eq!(backend.upload_calls(), 0);
        let snapshot = controller.snapshot();
        assert!(snapshot.asset.is_none());
        assert!(snapshot.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_rejected_while_first_pending() {
        let (controller, backend) = controller(
            MockBackend::new()
                .with_progress(&[10.0])
                .with_start_delay(Duration::from_millis(100)),
        );
        controller.submit_video(&video("clip.mp4")).await.unwrap();

        let (first, second) = tokio::join!(controller.start(), controller.start());

        assert!(first.is_ok());
        assert_eq!(second, Err(JobError::Precondition(Precondition::JobInFlight)));
        assert_eq!(backend.start_calls(), 1);
        assert_eq!(controller.state(), JobState::Processing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_processing_rejected() {
        let (controller, backend) = controller(MockBackend::new().with_progress(&[10.0]));
        controller.submit_video(&video("clip.mp4")).await.unwrap();
        controller.start().await.unwrap();

        assert_eq!(
            controller.start().await,
            Err(JobError::Precondition(Precondition::JobInFlight))
        );
        assert_eq!(backend.start_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_backend_blocks_start() {
        let (controller, backend) =
            controller(MockBackend::new().with_health_delay(Duration::from_secs(10)));
        controller.submit_video(&video("clip.mp4")).await.unwrap();

        let err = controller.start().await.unwrap_err();

        assert_eq!(err, JobError::BackendUnavailable(UnavailableReason::Timeout));
        assert_eq!(backend.start_calls(), 0);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, JobState::Idle);
        assert_eq!(snapshot.last_error.unwrap().error, err);

        // The reservation is released
        assert!(!controller.inner.state.lock().start_pending);
    }

    #[tokio::test]
    async fn test_start_rejected_by_backend_returns_to_idle() {
        let (controller, _) = controller(MockBackend::new().with_start_error(BackendError::Status {
            status: 400,
            message: "No video uploaded".to_string(),
        }));
        controller.submit_video(&video("clip.mp4")).await.unwrap();
        let mut events = controller.subscribe();

        let err = controller.start().await.unwrap_err();

        assert_eq!(
            err,
            JobError::Server {
                status: 400,
                message: "No video uploaded".to_string()
            }
        );
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, JobState::Idle);
        assert!(snapshot.job.is_none());
        assert_eq!(snapshot.last_error.unwrap().error, err);

        let failed = wait_for(&mut events, |e| matches!(e, JobEvent::Failed(_))).await;
        assert!(matches!(failed, JobEvent::Failed(info) if info.error == err));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_never_decreases() {
        let (controller, _) =
            controller(MockBackend::new().with_progress(&[10.0, 40.0, 30.0, 100.0]));
        controller.submit_video(&video("clip.mp4")).await.unwrap();
        let mut events = controller.subscribe();
        controller.start().await.unwrap();

        let mut observed = Vec::new();
        let mut reported = Vec::new();
        loop {
            match next_event(&mut events).await {
                JobEvent::Progress(update) => {
                    assert_eq!(update.frame, FrameEstimate::Unknown);
                    observed.push(update.progress_percent);
                    reported.push(update.reported_percent);
                }
                JobEvent::Completed(_) => break,
                _ => {}
            }
        }

        assert_eq!(observed, vec![10.0, 40.0, 40.0, 100.0]);
        assert_eq!(reported, vec![10.0, 40.0, 30.0, 100.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_job_fetches_summary_once() {
        let (controller, backend) = controller(MockBackend::new().with_progress(&[50.0, 100.0]));
        controller.submit_video(&video("clip.mp4")).await.unwrap();
        let mut events = controller.subscribe();
        controller.start().await.unwrap();

        let completed = wait_for(&mut events, |e| matches!(e, JobEvent::Completed(_))).await;
        let JobEvent::Completed(from_event) = completed else {
            unreachable!()
        };

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, JobState::Completed);
        assert_eq!(snapshot.job.as_ref().unwrap().state, JobState::Completed);
        assert_eq!(snapshot.job.as_ref().unwrap().progress_percent, 100.0);
        assert_eq!(snapshot.frame, FrameEstimate::Known(40));

        let summary = controller.summary().await.unwrap();
        assert!(Arc::ptr_eq(&summary, &from_event));
        assert_eq!(backend.detections_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_job_cannot_restart_until_new_upload() {
        let (controller, _) = controller(MockBackend::new().with_progress(&[100.0]));
        controller.submit_video(&video("clip.mp4")).await.unwrap();
        let mut events = controller.subscribe();
        controller.start().await.unwrap();
        wait_for(&mut events, |e| matches!(e, JobEvent::Completed(_))).await;

        assert_eq!(
            controller.start().await,
            Err(JobError::Precondition(Precondition::AlreadyCompleted))
        );

        controller.submit_video(&video("next.mp4")).await.unwrap();
        assert_eq!(controller.state(), JobState::Idle);
        assert!(controller.start().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_failure_moves_to_failed() {
        let (controller, backend) = controller(MockBackend::new().with_statuses(vec![
            Ok(status(30.0, true)),
            Ok(status(0.0, false)),
        ]));
        controller.submit_video(&video("clip.mp4")).await.unwrap();
        let mut events = controller.subscribe();
        controller.start().await.unwrap();

        let failed = wait_for(&mut events, |e| matches!(e, JobEvent::Failed(_))).await;
        assert!(matches!(failed, JobEvent::Failed(info) if matches!(info.error, JobError::Processing(_))));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, JobState::Failed);
        assert!(snapshot.job.unwrap().last_error.is_some());
        assert_eq!(backend.detections_calls(), 0);
        assert_eq!(
            controller.summary().await,
            Err(JobError::Precondition(Precondition::NotCompleted))
        );

        // A failed job may be re-run
        assert!(controller.start().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_failure_while_polling_moves_to_failed() {
        let (controller, _) = controller(MockBackend::new().with_statuses(vec![
            Ok(status(30.0, true)),
            Err(BackendError::Transport("connection reset".to_string())),
        ]));
        controller.submit_video(&video("clip.mp4")).await.unwrap();
        let mut events = controller.subscribe();
        controller.start().await.unwrap();

        let failed = wait_for(&mut events, |e| matches!(e, JobEvent::Failed(_))).await;
        assert!(matches!(failed, JobEvent::Failed(info) if info.error == JobError::Network("connection reset".to_string())));
        assert_eq!(controller.state(), JobState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_upload_supersedes_running_job() {
        let (controller, backend) = controller(MockBackend::new().with_progress(&[10.0]));
        controller.submit_video(&video("first.mp4")).await.unwrap();
        let mut events = controller.subscribe();
        controller.start().await.unwrap();
        wait_for(&mut events, |e| matches!(e, JobEvent::Progress(_))).await;

        controller.submit_video(&video("second.mp4")).await.unwrap();
        let calls = backend.status_calls();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let mut replaced = false;
        while let Ok(event) = events.try_recv() {
            match event {
                JobEvent::AssetReplaced(_) => replaced = true,
                JobEvent::Progress(_) if replaced => panic!("progress after new upload"),
                _ => {}
            }
        }
        assert!(replaced);
        assert_eq!(backend.status_calls(), calls);

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, JobState::Idle);
        assert!(snapshot.job.is_none());
        assert_eq!(snapshot.asset.unwrap().name, "second.mp4");
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_during_start_supersedes_start() {
        let (controller, backend) = controller(
            MockBackend::new()
                .with_progress(&[10.0])
                .with_start_delay(Duration::from_secs(1)),
        );
        controller.submit_video(&video("first.mp4")).await.unwrap();

        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.start().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.submit_video(&video("second.mp4")).await.unwrap();

        assert_eq!(
            pending.await.unwrap(),
            Err(JobError::Precondition(Precondition::Superseded))
        );
        assert_eq!(controller.state(), JobState::Idle);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(backend.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_upload_leaves_running_job() {
        let (controller, _) = controller(MockBackend::new().with_progress(&[10.0]));
        controller.submit_video(&video("first.mp4")).await.unwrap();
        let job_id = controller.start().await.unwrap();

        let backend = Arc::clone(&controller.inner.backend);
        backend.fail_next_upload(BackendError::Transport("connection reset".to_string()));
        let err = controller.submit_video(&video("second.mp4")).await.unwrap_err();

        assert!(matches!(err, JobError::Network(_)));
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, JobState::Processing);
        assert_eq!(snapshot.job.unwrap().id, job_id);
        assert_eq!(snapshot.asset.unwrap().name, "first.mp4");
        assert_eq!(snapshot.last_error.unwrap().error, err);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_upload_after_completion_keeps_results() {
        let (controller, backend) = controller(MockBackend::new().with_progress(&[100.0]));
        controller.submit_video(&video("clip.mp4")).await.unwrap();
        let mut events = controller.subscribe();
        controller.start().await.unwrap();
        wait_for(&mut events, |e| matches!(e, JobEvent::Completed(_))).await;

        backend.fail_next_upload(BackendError::Transport("connection reset".to_string()));
        let err = controller.submit_video(&video("next.mp4")).await.unwrap_err();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, JobState::Completed);
        assert_eq!(snapshot.job.unwrap().state, JobState::Completed);
        assert!(snapshot.summary.is_some());
        assert_eq!(snapshot.asset.unwrap().name, "clip.mp4");
        assert_eq!(snapshot.last_error.unwrap().error, err);

        assert!(controller.summary().await.is_ok());
        assert_eq!(
            controller.start().await,
            Err(JobError::Precondition(Precondition::AlreadyCompleted))
        );
        assert_eq!(backend.start_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_start_returns_to_idle() {
        let (controller, backend) = controller(
            MockBackend::new()
                .with_progress(&[10.0])
                .with_start_delay(Duration::from_secs(5)),
        );
        controller.submit_video(&video("clip.mp4")).await.unwrap();

        let abandoned = tokio::time::timeout(Duration::from_secs(1), controller.start()).await;
        assert!(abandoned.is_err());
        assert_eq!(controller.state(), JobState::Idle);
        assert!(controller.snapshot().job.is_none());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(controller.state(), JobState::Idle);
        assert_eq!(backend.status_calls(), 0);

        controller.start().await.unwrap();
        assert_eq!(controller.state(), JobState::Processing);
        assert_eq!(backend.start_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_summary_failure_reported_and_retryable() {
        let (controller, backend) = controller(
            MockBackend::new()
                .with_progress(&[100.0])
                .with_summary_error(BackendError::Status {
                    status: 500,
                    message: "Internal Server Error".to_string(),
                }),
        );
        controller.submit_video(&video("clip.mp4")).await.unwrap();
        let mut events = controller.subscribe();
        controller.start().await.unwrap();

        wait_for(&mut events, |e| matches!(e, JobEvent::SummaryUnavailable(_))).await;
        assert_eq!(controller.state(), JobState::Completed);
        assert!(controller.snapshot().summary.is_none());

        backend.set_summary(Ok(crate::backend::mock::sample_summary()));
        let summary = controller.summary().await.unwrap();
        assert_eq!(summary.total_count, 2);
        assert!(controller.snapshot().last_error.is_none());
        assert!(matches!(next_event(&mut events).await, JobEvent::Completed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_detections_for_current_job() {
        let frame = FrameDetection::new(5, 0.2, vec![]);
        let (controller, _) =
            controller(MockBackend::new().with_progress(&[100.0]).with_frame(frame.clone()));

        assert_eq!(
            controller.frame_detections(5).await,
            Err(JobError::Precondition(Precondition::NoJob))
        );

        controller.submit_video(&video("clip.mp4")).await.unwrap();
        controller.start().await.unwrap();

        assert_eq!(controller.frame_detections(5).await.unwrap(), frame);
        assert!(matches!(
            controller.frame_detections(6).await,
            Err(JobError::Server { status: 404, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_change_events_in_order() {
        let (controller, _) = controller(MockBackend::new().with_progress(&[40.0, 100.0]));
        controller.submit_video(&video("clip.mp4")).await.unwrap();
        let mut events = controller.subscribe();
        controller.start().await.unwrap();

        let mut transitions = Vec::new();
        loop {
            match next_event(&mut events).await {
                JobEvent::StateChanged { from, to } => transitions.push((from, to)),
                JobEvent::Completed(_) => break,
                _ => {}
            }
        }

        assert_eq!(
            transitions,
            vec![
                (JobState::Idle, JobState::Starting),
                (JobState::Starting, JobState::Processing),
                (JobState::Processing, JobState::Completed),
            ]
        );
    }
}
