//! User configuration for slamwatch.
//!
//! Settings are read from `~/.slamwatch/config.ini`. Missing files and
//! missing keys fall back to defaults; present keys are validated.
//!
//! # Example
//!
//! ```
//! use slamwatch::config::{ConfigFile, ConfigKey};
//!
//! let mut config = ConfigFile::default();
//! ConfigKey::PollingIntervalMs.set(&mut config, "250").unwrap();
//! assert_eq!(ConfigKey::PollingIntervalMs.get(&config), "250");
//! ```

mod defaults;
mod file;
mod keys;
mod parser;
mod settings;
mod size;
mod writer;

pub use defaults::{DEFAULT_LOG_FILE_NAME, MIN_POLL_INTERVAL_MS};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{
    BackendSettings, ConfigFile, ConnectivitySettings, LoggingSettings, PollingSettings,
    UploadSettings,
};
pub use size::{format_size, parse_size, SizeParseError};
