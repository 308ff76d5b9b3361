//! Status polling.
//!
//! [`StatusPoller::poll`] follows one job until it reaches a terminal
//! status. Requests are issued one at a time: the next request is sent only
//! after the previous response has been handled and the poll interval has
//! elapsed, so a slow backend never sees overlapping status requests.
//!
//! The loop exits early when its [`GenerationToken`] is superseded, both
//! while a request is in flight and while waiting for the next tick.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, DetectionBackend, ProcessingStatus};
use crate::generation::GenerationToken;

/// Default pause between status requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Errors that end a poll.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// A status request failed.
    #[error("Status request failed: {0}")]
    Network(BackendError),

    /// The backend stopped processing without completing.
    #[error("Backend reported processing failure: {0}")]
    BackendReportedFailure(String),

    /// The poll's generation was superseded.
    #[error("Stale poll result discarded")]
    StaleResultDiscarded,
}

/// How a single status snapshot should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPhase {
    /// Still processing.
    Running,
    /// Finished successfully.
    Succeeded,
    /// Stopped before completing.
    Failed,
}

/// Classify a snapshot.
///
/// A snapshot is terminal once `is_processing` is false. It counts as a
/// success only if progress reached 100; the backend resets progress when
/// a run aborts.
pub fn classify(status: &ProcessingStatus) -> StatusPhase {
    if status.is_processing {
        StatusPhase::Running
    } else if status.progress >= 100.0 {
        StatusPhase::Succeeded
    } else {
        StatusPhase::Failed
    }
}

/// Polls the backend's status endpoint.
pub struct StatusPoller<B> {
    backend: Arc<B>,
    interval: Duration,
}

impl<B: DetectionBackend> StatusPoller<B> {
    pub fn new(backend: Arc<B>, interval: Duration) -> Self {
        Self { backend, interval }
    }

    /// Poll until the job finishes, fails, or `token` is superseded.
    ///
    /// `on_snapshot` sees every snapshot received while the token is
    /// current, including the terminal one. On success the terminal
    /// snapshot is returned.
    pub async fn poll<F>(
        &self,
        token: &GenerationToken,
        mut on_snapshot: F,
    ) -> Result<ProcessingStatus, PollError>
    where
        F: FnMut(&ProcessingStatus) + Send,
    {
        debug!(
            generation = token.id(),
            interval_ms = self.interval.as_millis() as u64,
            "Status polling started"
        );
        let mut polls: u64 = 0;

        loop {
            if !token.is_current() {
                return Err(self.discarded(token, polls));
            }

            let response = tokio::select! {
                biased;
                _ = token.superseded() => return Err(self.discarded(token, polls)),
                response = self.backend.processing_status() => response,
            };
            polls += 1;

            if !token.is_current() {
                return Err(self.discarded(token, polls));
            }

            let status = match response {
                Ok(status) => status,
                Err(e) => {
                    warn!(generation = token.id(), polls, error = %e, "Status request failed");
                    return Err(PollError::Network(e));
                }
            };

            on_snapshot(&status);

            match classify(&status) {
                StatusPhase::Running => {}
                StatusPhase::Succeeded => {
                    info!(
                        generation = token.id(),
                        polls,
                        detections = status.detections_count,
                        "Processing completed"
                    );
                    return Ok(status);
                }
                StatusPhase::Failed => {
                    warn!(
                        generation = token.id(),
                        polls,
                        progress = status.progress,
                        "Processing stopped before completion"
                    );
                    return Err(PollError::BackendReportedFailure(format!(
                        "processing stopped at {:.1}%",
                        status.progress
                    )));
                }
            }

            tokio::select! {
                biased;
                _ = token.superseded() => return Err(self.discarded(token, polls)),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    fn discarded(&self, token: &GenerationToken, polls: u64) -> PollError {
        debug!(generation = token.id(), polls, "Status polling superseded");
        PollError::StaleResultDiscarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{status, MockBackend};
    use crate::generation::GenerationCounter;

    #[test]
    fn test_classify() {
        assert_eq!(classify(&status(40.0, true)), StatusPhase::Running);
        assert_eq!(classify(&status(100.0, true)), StatusPhase::Running);
        assert_eq!(classify(&status(100.0, false)), StatusPhase::Succeeded);
        assert_eq!(classify(&status(0.0, false)), StatusPhase::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_complete() {
        let backend = Arc::new(MockBackend::new().with_progress(&[10.0, 50.0, 100.0]));
        let poller = StatusPoller::new(backend.clone(), DEFAULT_POLL_INTERVAL);
        let generations = GenerationCounter::new();
        let token = generations.advance();

        let mut seen = Vec::new();
        let result = poller.poll(&token, |s| seen.push(s.progress)).await;

        let last = result.unwrap();
        assert!(!last.is_processing);
        assert_eq!(seen, vec![10.0, 50.0, 100.0]);
        assert_eq!(backend.status_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_waits_interval_between_requests() {
        let backend = Arc::new(MockBackend::new().with_progress(&[10.0, 50.0, 100.0]));
        let poller = StatusPoller::new(backend, Duration::from_secs(2));
        let token = GenerationCounter::new().advance();

        let started = tokio::time::Instant::now();
        poller.poll(&token, |_| {}).await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_never_overlaps_requests() {
        let backend = Arc::new(
            MockBackend::new()
                .with_progress(&[5.0, 20.0, 60.0, 100.0])
                .with_status_delay(Duration::from_millis(3500)),
        );
        let poller = StatusPoller::new(backend.clone(), Duration::from_millis(100));
        let token = GenerationCounter::new().advance();

        poller.poll(&token, |_| {}).await.unwrap();

        assert_eq!(backend.status_calls(), 4);
        assert_eq!(backend.max_concurrent_status_requests(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_reports_backend_failure() {
        let backend = Arc::new(MockBackend::new().with_statuses(vec![
            Ok(status(30.0, true)),
            Ok(status(0.0, false)),
        ]));
        let poller = StatusPoller::new(backend, DEFAULT_POLL_INTERVAL);
        let token = GenerationCounter::new().advance();

        let mut snapshots = 0;
        let err = poller.poll(&token, |_| snapshots += 1).await.unwrap_err();

        assert!(matches!(err, PollError::BackendReportedFailure(_)));
        assert_eq!(snapshots, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_network_error_ends_poll() {
        let backend = Arc::new(MockBackend::new().with_statuses(vec![
            Ok(status(30.0, true)),
            Err(BackendError::Transport("connection refused".to_string())),
        ]));
        let poller = StatusPoller::new(backend.clone(), DEFAULT_POLL_INTERVAL);
        let token = GenerationCounter::new().advance();

        let err = poller.poll(&token, |_| {}).await.unwrap_err();
        assert_eq!(
            err,
            PollError::Network(BackendError::Transport("connection refused".to_string()))
        );
        assert_eq!(backend.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_token_stops_poll() {
        // Never completes on its own
        let backend = Arc::new(MockBackend::new().with_progress(&[10.0]));
        let poller = Arc::new(StatusPoller::new(backend.clone(), DEFAULT_POLL_INTERVAL));
        let generations = Arc::new(GenerationCounter::new());
        let token = generations.advance();

        let handle = {
            let poller = poller.clone();
            tokio::spawn(async move { poller.poll(&token, |_| {}).await })
        };

        tokio::time::sleep(Duration::from_millis(3500)).await;
        generations.advance();

        let result = handle.await.unwrap();
        assert_eq!(result, Err(PollError::StaleResultDiscarded));

        let calls = backend.status_calls();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.status_calls(), calls);
    }

    #[tokio::test]
    async fn test_already_stale_token_sends_nothing() {
        let backend = Arc::new(MockBackend::new());
        let poller = StatusPoller::new(backend.clone(), DEFAULT_POLL_INTERVAL);
        let generations = GenerationCounter::new();
        let token = generations.advance();
        generations.advance();

        let result = poller.poll(&token, |_| panic!("no snapshot expected")).await;
        assert_eq!(result, Err(PollError::StaleResultDiscarded));
        assert_eq!(backend.status_calls(), 0);
    }
}
