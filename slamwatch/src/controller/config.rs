//! Controller configuration.

use std::time::Duration;

use crate::config::ConfigFile;
use crate::connectivity::DEFAULT_CONNECTIVITY_TIMEOUT;
use crate::poller::DEFAULT_POLL_INTERVAL;
use crate::upload::UploadConstraints;

/// Default capacity of the event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Tuning for [`JobController`](super::JobController).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub poll_interval: Duration,
    pub connectivity_timeout: Duration,
    pub upload: UploadConstraints,
    /// Events buffered per subscriber before slow subscribers start lagging.
    pub event_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            connectivity_timeout: DEFAULT_CONNECTIVITY_TIMEOUT,
            upload: UploadConstraints::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ControllerConfig {
    /// Build from the user's configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            poll_interval: config.polling.interval,
            connectivity_timeout: config.connectivity.timeout,
            upload: UploadConstraints {
                max_size_bytes: config.upload.max_size_bytes,
                allowed_extensions: config.upload.allowed_extensions.clone(),
                verify_signature: config.upload.verify_signature,
            },
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_connectivity_timeout(mut self, timeout: Duration) -> Self {
        self.connectivity_timeout = timeout;
        self
    }
}
