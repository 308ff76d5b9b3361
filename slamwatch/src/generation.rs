//! Generation tokens for discarding stale asynchronous results.
//!
//! Every job the controller starts runs under a generation. Advancing the
//! generation cancels the previous token, so a poll loop or a result fetch
//! still holding it can notice it has been superseded and drop whatever it
//! was about to report instead of mutating the newer job's state.
//!
//! # Example
//!
//! ```
//! use slamwatch::generation::GenerationCounter;
//!
//! let generations = GenerationCounter::new();
//! let first = generations.advance();
//! assert!(first.is_current());
//!
//! let second = generations.advance();
//! assert!(!first.is_current());
//! assert!(second.is_current());
//! assert!(second.id() > first.id());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Monotonic source of [`GenerationToken`]s.
///
/// Only the most recently issued token is live.
pub struct GenerationCounter {
    /// Id of the most recently issued generation (0 = none issued yet).
    current: AtomicU64,
    /// Cancellation handle of the live generation.
    live: Mutex<CancellationToken>,
}

impl Default for GenerationCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationCounter {
    /// Create a counter with no generation issued.
    pub fn new() -> Self {
        Self {
            current: AtomicU64::new(0),
            live: Mutex::new(CancellationToken::new()),
        }
    }

    /// Advance to a new generation, invalidating every outstanding token.
    pub fn advance(&self) -> GenerationToken {
        let mut live = self.live.lock();
        live.cancel();

        let cancel = CancellationToken::new();
        *live = cancel.clone();
        let id = self.current.fetch_add(1, Ordering::SeqCst) + 1;

        GenerationToken { id, cancel }
    }

    /// Id of the most recently issued generation.
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

/// Handle identifying one generation.
///
/// Cheap to clone; all clones observe the same cancellation.
#[derive(Clone)]
pub struct GenerationToken {
    id: u64,
    cancel: CancellationToken,
}

impl GenerationToken {
    /// Generation number of this token.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns true while no newer generation has been issued.
    pub fn is_current(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Resolves once a newer generation has been issued.
    pub async fn superseded(&self) {
        self.cancel.cancelled().await
    }
}

impl fmt::Debug for GenerationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationToken")
            .field("id", &self.id)
            .field("current", &self.is_current())
            .finish()
    }
}
