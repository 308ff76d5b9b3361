//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;
use std::time::Duration;

use crate::backend::BackendConfig;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Detection backend connection
    pub backend: BackendSettings,
    /// Status polling
    pub polling: PollingSettings,
    /// Connectivity probing before a job starts
    pub connectivity: ConnectivitySettings,
    /// Client-side upload validation
    pub upload: UploadSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Connection settings for the HTTP backend.
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig::new(self.backend.url.clone())
            .with_timeout(Duration::from_secs(self.backend.request_timeout_secs))
    }
}

/// Backend connection configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSettings {
    /// Base URL of the detection backend
    pub url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Status polling configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PollingSettings {
    /// Delay between the end of one status request and the start of the next
    pub interval: Duration,
}

/// Connectivity probe configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivitySettings {
    /// Probe budget; a slower backend is treated as unavailable
    pub timeout: Duration,
}

/// Upload validation configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSettings {
    pub max_size_bytes: u64,
    /// Lowercase extensions without the leading dot
    pub allowed_extensions: Vec<String>,
    /// Check the container signature in the first bytes of the file
    pub verify_signature: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
