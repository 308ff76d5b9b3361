//! Default values and constants for all configuration settings.
//!
//! Contains the `DEFAULT_*` constants that only exist at the configuration
//! layer, and the `ConfigFile::default()` implementation.

use super::settings::*;
use crate::backend::{DEFAULT_BACKEND_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::connectivity::DEFAULT_CONNECTIVITY_TIMEOUT;
use crate::poller::DEFAULT_POLL_INTERVAL;
use crate::upload::{DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_UPLOAD_BYTES};

/// Name of the default log file inside the config directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "slamwatch.log";

/// Lower bound for the polling interval in milliseconds.
pub const MIN_POLL_INTERVAL_MS: u64 = 50;

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = super::file::config_directory();

        Self {
            backend: BackendSettings {
                url: DEFAULT_BACKEND_URL.to_string(),
                request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            },
            polling: PollingSettings {
                interval: DEFAULT_POLL_INTERVAL,
            },
            connectivity: ConnectivitySettings {
                timeout: DEFAULT_CONNECTIVITY_TIMEOUT,
            },
            upload: UploadSettings {
                max_size_bytes: DEFAULT_MAX_UPLOAD_BYTES,
                allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                    .iter()
                    .map(|e| e.to_string())
                    .collect(),
                verify_signature: false,
            },
            logging: LoggingSettings {
                file: config_dir.join(DEFAULT_LOG_FILE_NAME),
            },
        }
    }
}
