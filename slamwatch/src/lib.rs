//! slamwatch - Job orchestration client for a CV/SLAM detection backend
//!
//! This library drives a remote video analysis backend: it validates and
//! uploads a video, starts processing, polls progress until the job reaches
//! a terminal state, and fetches the resulting detections.
//!
//! # High-Level API
//!
//! For most use cases, [`controller::JobController`] is the single entry point:
//!
//! ```ignore
//! use std::sync::Arc;
//! use slamwatch::backend::{BackendConfig, HttpBackend};
//! use slamwatch::controller::{ControllerConfig, JobController};
//! use slamwatch::upload::VideoFile;
//!
//! let backend = Arc::new(HttpBackend::new(&BackendConfig::default())?);
//! let controller = JobController::new(backend, ControllerConfig::default());
//! let mut events = controller.subscribe();
//!
//! controller.submit_video(&VideoFile::from_path("flight.mp4").await?).await?;
//! controller.start().await?;
//! ```

pub mod backend;
pub mod config;
pub mod connectivity;
pub mod controller;
pub mod detection;
pub mod error;
pub mod generation;
pub mod logging;
pub mod poller;
pub mod progress;
pub mod results;
pub mod upload;

/// Version of the slamwatch library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
