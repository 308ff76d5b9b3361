//! Backend reachability probing.
//!
//! [`ConnectivityMonitor::probe`] issues a bounded health check and reports
//! whether the backend is reachable. The controller probes before every
//! start so an unreachable backend is reported as such rather than as a
//! generic request failure.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::backend::{BackendError, DetectionBackend};

/// Default bound on a single probe.
pub const DEFAULT_CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Why the backend was judged unreachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    /// No answer within the probe timeout.
    Timeout,
    /// The request failed before any answer arrived.
    Network(String),
    /// The backend answered, but not with a success status.
    Rejected { status: u16 },
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::Timeout => write!(f, "health check timed out"),
            UnavailableReason::Network(msg) => write!(f, "{}", msg),
            UnavailableReason::Rejected { status } => {
                write!(f, "health check returned HTTP {}", status)
            }
        }
    }
}

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connectivity {
    Available,
    Unavailable(UnavailableReason),
}

impl Connectivity {
    pub fn is_available(&self) -> bool {
        matches!(self, Connectivity::Available)
    }
}

/// The most recent probe and when it ran.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRecord {
    pub result: Connectivity,
    pub latency: Duration,
    pub checked_at: DateTime<Utc>,
}

/// Probes backend reachability.
pub struct ConnectivityMonitor<B> {
    backend: Arc<B>,
    timeout: Duration,
    last: Mutex<Option<ProbeRecord>>,
}

impl<B: DetectionBackend> ConnectivityMonitor<B> {
    pub fn new(backend: Arc<B>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            last: Mutex::new(None),
        }
    }

    /// Timeout applied to each probe.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check whether the backend answers its health endpoint in time.
    ///
    /// Never fails; every failure mode maps to an [`UnavailableReason`].
    pub async fn probe(&self) -> Connectivity {
        let started = Instant::now();

        let result = match tokio::time::timeout(self.timeout, self.backend.health()).await {
            Ok(Ok(health)) => {
                debug!(
                    status = %health.status,
                    message = %health.message,
                    "Backend health check passed"
                );
                Connectivity::Available
            }
            Ok(Err(BackendError::Timeout)) | Err(_) => {
                Connectivity::Unavailable(UnavailableReason::Timeout)
            }
            Ok(Err(BackendError::Status { status, .. })) => {
                Connectivity::Unavailable(UnavailableReason::Rejected { status })
            }
            Ok(Err(e)) => Connectivity::Unavailable(UnavailableReason::Network(e.to_string())),
        };

        let latency = started.elapsed();
        if let Connectivity::Unavailable(reason) = &result {
            warn!(
                reason = %reason,
                timeout_ms = self.timeout.as_millis() as u64,
                "Backend unreachable"
            );
        }

        *self.last.lock() = Some(ProbeRecord {
            result: result.clone(),
            latency,
            checked_at: Utc::now(),
        });

        result
    }

    /// The most recent probe, if any has run.
    pub fn last_probe(&self) -> Option<ProbeRecord> {
        self.last.lock().clone()
    }
}
