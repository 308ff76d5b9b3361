//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use slamwatch::backend::BackendError;
use slamwatch::config::{ConfigFileError, ConfigKeyError};
use slamwatch::error::JobError;

/// Exit code used when the user interrupts with Ctrl+C.
const EXIT_INTERRUPTED: i32 = 130;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to build the HTTP client
    ClientCreation(BackendError),
    /// A direct backend request failed
    Backend(BackendError),
    /// The job controller rejected or failed an operation
    Job(JobError),
    /// Interrupted before the job finished
    Interrupted,
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        if let CliError::Interrupted = self {
            eprintln!();
            eprintln!("Stopped following. Processing continues on the backend;");
            eprintln!("run 'slamwatch status' to check on it.");
            process::exit(EXIT_INTERRUPTED);
        }

        eprintln!("Error: {}", self);

        match self {
            CliError::Job(JobError::BackendUnavailable(_))
            | CliError::Backend(BackendError::Transport(_))
            | CliError::Backend(BackendError::Timeout) => {
                eprintln!();
                eprintln!("Make sure:");
                eprintln!("  1. The detection backend is running");
                eprintln!("  2. backend.url points at it (slamwatch config get backend.url)");
                eprintln!("  3. Nothing between you and the backend blocks the port");
            }
            CliError::Job(JobError::Validation(_)) => {
                eprintln!();
                eprintln!("Upload limits are configurable:");
                eprintln!("  slamwatch config set upload.max_size 2GB");
                eprintln!("  slamwatch config set upload.allowed_extensions \"mp4, mov\"");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ClientCreation(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Backend(e) => write!(f, "Backend request failed: {}", e),
            CliError::Job(e) => write!(f, "{}", e),
            CliError::Interrupted => write!(f, "Interrupted"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ClientCreation(e) => Some(e),
            CliError::Backend(e) => Some(e),
            CliError::Job(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ConfigKeyError> for CliError {
    fn from(e: ConfigKeyError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<JobError> for CliError {
    fn from(e: JobError) -> Self {
        CliError::Job(e)
    }
}

impl From<BackendError> for CliError {
    fn from(e: BackendError) -> Self {
        CliError::Backend(e)
    }
}
