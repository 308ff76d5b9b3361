//! The video currently held by the backend.

use chrono::{DateTime, Utc};

use crate::backend::{CurrentVideo, UploadResponse};

/// A video the backend has accepted.
///
/// At most one asset is current at a time; a successful upload replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoAsset {
    pub name: String,
    pub size_bytes: u64,
    /// Where the backend stored the file. Starts as the reported path (or
    /// the file name) and is refined from status snapshots.
    pub backend_path: String,
    pub uploaded_at: DateTime<Utc>,
}

impl VideoAsset {
    /// Build an asset from the backend's upload acknowledgement.
    pub fn from_ack(ack: &UploadResponse, fallback_name: &str, fallback_size: u64) -> Self {
        let name = if ack.filename.is_empty() {
            fallback_name.to_string()
        } else {
            ack.filename.clone()
        };
        let size_bytes = if ack.size > 0 { ack.size } else { fallback_size };
        let backend_path = ack
            .path
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| name.clone());

        Self {
            name,
            size_bytes,
            backend_path,
            uploaded_at: Utc::now(),
        }
    }

    /// Adopt the backend's view of the asset when it refers to this file.
    ///
    /// Returns true if anything changed.
    pub fn refresh_from(&mut self, current: &CurrentVideo) -> bool {
        if current.filename != self.name || current.path.is_empty() {
            return false;
        }
        if current.path == self.backend_path {
            return false;
        }
        self.backend_path = current.path.clone();
        if let Some(at) = current.uploaded_at() {
            self.uploaded_at = at;
        }
        true
    }
}
