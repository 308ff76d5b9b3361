//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization, and backend and
//! controller creation to reduce duplication across command handlers.

use crate::error::CliError;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use slamwatch::backend::HttpBackend;
use slamwatch::config::{ConfigFile, MIN_POLL_INTERVAL_MS};
use slamwatch::controller::{ControllerConfig, JobController};
use slamwatch::logging::{init_logging_full, LoggingGuard};

/// Options shared by every command that talks to the backend.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Overrides `backend.url` from config.ini
    pub backend_url: Option<String>,
    /// Debug-level logging, mirrored to stderr
    pub debug: bool,
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file, with CLI overrides applied
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// Console logging is only enabled in debug mode and goes to stderr,
    /// so the progress display on stdout is never interleaved with it.
    pub fn new(options: &GlobalOptions) -> Result<Self, CliError> {
        let mut config = ConfigFile::load()?;
        if let Some(url) = &options.backend_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CliError::Config(format!(
                    "--backend-url must start with http:// or https:// (got '{}')",
                    url
                )));
            }
            config.backend.url = url.trim_end_matches('/').to_string();
        }

        let console = options.debug && atty::is(atty::Stream::Stderr);
        let logging_guard = init_logging_full(&config.logging.file, console, options.debug)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!(version = slamwatch::VERSION, command, "slamwatch CLI starting");
        info!(backend = %self.config.backend.url, "Using detection backend");
    }

    /// Create an HTTP client for the configured backend.
    pub fn create_backend(&self) -> Result<Arc<HttpBackend>, CliError> {
        HttpBackend::new(&self.config.backend_config())
            .map(Arc::new)
            .map_err(CliError::ClientCreation)
    }

    /// Create a job controller, optionally overriding the poll interval.
    pub fn create_controller(
        &self,
        poll_interval_ms: Option<u64>,
    ) -> Result<JobController<HttpBackend>, CliError> {
        let mut controller_config = ControllerConfig::from_config_file(&self.config);
        if let Some(ms) = poll_interval_ms {
            if ms < MIN_POLL_INTERVAL_MS {
                return Err(CliError::Config(format!(
                    "--interval-ms must be at least {}",
                    MIN_POLL_INTERVAL_MS
                )));
            }
            controller_config = controller_config.with_poll_interval(Duration::from_millis(ms));
        }

        let backend = self.create_backend()?;
        info!(
            poll_interval_ms = controller_config.poll_interval.as_millis() as u64,
            connectivity_timeout_ms = controller_config.connectivity_timeout.as_millis() as u64,
            "Job controller created"
        );
        Ok(JobController::new(backend, controller_config))
    }
}
