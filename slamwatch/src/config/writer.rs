//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;
use super::size::format_size;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[backend]
; Base URL of the detection backend
url = {}
; Timeout for every HTTP request, in seconds
request_timeout_secs = {}

[polling]
; Delay between processing status requests, in milliseconds (minimum 50)
interval_ms = {}

[connectivity]
; The backend must answer a health check within this budget before a job
; is started, in milliseconds
timeout_ms = {}

[upload]
; Largest video accepted for upload (e.g. 500MB, 2GB)
max_size = {}
; Comma-separated list of accepted file extensions
allowed_extensions = {}
; Check the container signature (MP4/MOV, AVI, MKV/WebM) before uploading
verify_signature = {}

[logging]
; Log file path
file = {}
"#,
        config.backend.url,
        config.backend.request_timeout_secs,
        config.polling.interval.as_millis(),
        config.connectivity.timeout.as_millis(),
        format_size(config.upload.max_size_bytes),
        config.upload.allowed_extensions.join(", "),
        config.upload.verify_signature,
        path_to_string(&config.logging.file),
    )
}

/// Convert path to string, collapsing home dir to ~.
pub(super) fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
