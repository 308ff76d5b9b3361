//! Result retrieval.
//!
//! [`ResultAggregator`] fetches the detection summary of a completed job
//! once per generation and serves later requests from its cache. Concurrent
//! callers for the same generation are serialized so only one of them hits
//! the backend.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, DetectionBackend};
use crate::detection::{DetectionSummary, FrameDetection};
use crate::generation::GenerationToken;

/// Errors that can occur while fetching results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The backend request failed.
    #[error("Failed to fetch results: {0}")]
    Backend(BackendError),

    /// The backend has nothing recorded for the frame.
    #[error("No detections recorded for frame {0}")]
    FrameNotFound(u64),

    /// The fetch's generation was superseded.
    #[error("Stale result discarded")]
    StaleResultDiscarded,
}

struct CachedSummary {
    generation: u64,
    summary: Arc<DetectionSummary>,
}

/// Fetches and caches detection results.
pub struct ResultAggregator<B> {
    backend: Arc<B>,
    cache: Mutex<Option<CachedSummary>>,
}

impl<B: DetectionBackend> ResultAggregator<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            cache: Mutex::new(None),
        }
    }

    /// Fetch the summary for `token`'s generation.
    ///
    /// The first successful call per generation performs the request; later
    /// calls return the same `Arc`. Failures are not cached.
    pub async fn fetch_summary(
        &self,
        token: &GenerationToken,
    ) -> Result<Arc<DetectionSummary>, FetchError> {
        if !token.is_current() {
            return Err(FetchError::StaleResultDiscarded);
        }

        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref().filter(|c| c.generation == token.id()) {
            debug!(generation = token.id(), "Detection summary served from cache");
            return Ok(Arc::clone(&cached.summary));
        }

        let response = tokio::select! {
            biased;
            _ = token.superseded() => return Err(FetchError::StaleResultDiscarded),
            response = self.backend.detections() => response,
        };

        let summary = response.map_err(|e| {
            warn!(generation = token.id(), error = %e, "Detection summary fetch failed");
            FetchError::Backend(e)
        })?;

        if !token.is_current() {
            return Err(FetchError::StaleResultDiscarded);
        }

        info!(
            generation = token.id(),
            total_detections = summary.total_count,
            frames_processed = summary.frames_processed,
            classes = summary.per_class.len(),
            "Detection summary fetched"
        );

        let summary = Arc::new(summary);
        *cache = Some(CachedSummary {
            generation: token.id(),
            summary: Arc::clone(&summary),
        });
        Ok(summary)
    }

    /// Fetch the detections of one frame.
    pub async fn fetch_frame(
        &self,
        token: &GenerationToken,
        frame_number: u64,
    ) -> Result<FrameDetection, FetchError> {
        if !token.is_current() {
            return Err(FetchError::StaleResultDiscarded);
        }

        let response = self.backend.frame_detections(frame_number).await;
        if !token.is_current() {
            return Err(FetchError::StaleResultDiscarded);
        }

        match response {
            Ok(frame) => Ok(frame),
            Err(e) if e.is_not_found() => Err(FetchError::FrameNotFound(frame_number)),
            Err(e) => Err(FetchError::Backend(e)),
        }
    }

    /// Drop any cached summary.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    #[cfg(test)]
    async fn cached(&self, token: &GenerationToken) -> Option<Arc<DetectionSummary>> {
        self.cache
            .lock()
            .await
            .as_ref()
            .filter(|c| c.generation == token.id())
            .map(|c| Arc::clone(&c.summary))
    }
}
