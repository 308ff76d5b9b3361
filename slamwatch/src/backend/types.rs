//! Response payloads of the detection backend.
//!
//! Only the fields the client acts on are modeled; anything else in a
//! response is ignored.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// Response of `GET /`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// Response of `POST /upload-video`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub status: String,
    /// Server-side location of the stored file, when the backend reports it.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `POST /start-processing`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StartResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub pipeline: Option<String>,
}

/// The video the backend currently holds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentVideo {
    pub filename: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub size: u64,
    /// Upload time as seconds since the Unix epoch.
    #[serde(default)]
    pub uploaded_at: f64,
}

impl CurrentVideo {
    /// Upload time, if the backend reported a valid one.
    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        if !self.uploaded_at.is_finite() || self.uploaded_at <= 0.0 {
            return None;
        }
        let secs = self.uploaded_at.trunc() as i64;
        let nanos = (self.uploaded_at.fract() * 1e9) as u32;
        Utc.timestamp_opt(secs, nanos).single()
    }
}

/// Response of `GET /processing-status`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ProcessingStatus {
    #[serde(default)]
    pub is_processing: bool,
    /// Percent complete as reported; may be out of range or regress.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub current_video: Option<CurrentVideo>,
    #[serde(default)]
    pub detections_count: u64,
    #[serde(default)]
    pub slam_status: String,
}
