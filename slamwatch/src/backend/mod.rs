//! Detection backend access.
//!
//! The backend is a single-tenant HTTP service that accepts one video,
//! runs detection and SLAM over it in the background, and exposes the
//! running job through a status endpoint.
//!
//! # Architecture
//!
//! ```text
//! ConnectivityMonitor ─┐
//! UploadCoordinator ───┤
//! StatusPoller ────────┼── DetectionBackend trait ──► HttpBackend (reqwest)
//! ResultAggregator ────┘
//! ```
//!
//! Components depend on the [`DetectionBackend`] trait, never on the HTTP
//! client, so tests can substitute a scripted backend.

mod client;
mod error;
mod http;
mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use client::DetectionBackend;
pub use error::BackendError;
pub use http::{BackendConfig, HttpBackend, DEFAULT_BACKEND_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use types::{CurrentVideo, HealthResponse, ProcessingStatus, StartResponse, UploadResponse};
