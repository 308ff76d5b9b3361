//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`analyze`] - Upload a video and follow processing to completion
//! - [`config`] - Configuration management (get, set, list, path)
//! - [`frame`] - Per-frame detections
//! - [`health`] - Backend connectivity check
//! - [`status`] - Raw processing status
//! - [`output`] - Shared terminal formatting

pub mod analyze;
pub mod config;
pub mod frame;
pub mod health;
pub mod output;
pub mod status;
