//! Configuration key access and validation.
//!
//! This module provides a type-safe interface for getting and setting
//! configuration values by key name, with validation via the Specification Pattern.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use super::defaults::MIN_POLL_INTERVAL_MS;
use super::parser::{expand_tilde, parse_bool, parse_extensions};
use super::settings::ConfigFile;
use super::size::{format_size, parse_size};
use super::writer::path_to_string;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
///
/// Each key maps to a specific field in [`ConfigFile`] and knows how to
/// get and set its value with proper validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    BackendUrl,
    BackendRequestTimeoutSecs,
    PollingIntervalMs,
    ConnectivityTimeoutMs,
    UploadMaxSize,
    UploadAllowedExtensions,
    UploadVerifySignature,
    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "polling.interval_ms").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::BackendUrl => "backend.url",
            ConfigKey::BackendRequestTimeoutSecs => "backend.request_timeout_secs",
            ConfigKey::PollingIntervalMs => "polling.interval_ms",
            ConfigKey::ConnectivityTimeoutMs => "connectivity.timeout_ms",
            ConfigKey::UploadMaxSize => "upload.max_size",
            ConfigKey::UploadAllowedExtensions => "upload.allowed_extensions",
            ConfigKey::UploadVerifySignature => "upload.verify_signature",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Get the section name (e.g., "polling").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "interval_ms").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::BackendUrl => config.backend.url.clone(),
            ConfigKey::BackendRequestTimeoutSecs => config.backend.request_timeout_secs.to_string(),
            ConfigKey::PollingIntervalMs => config.polling.interval.as_millis().to_string(),
            ConfigKey::ConnectivityTimeoutMs => config.connectivity.timeout.as_millis().to_string(),
            ConfigKey::UploadMaxSize => format_size(config.upload.max_size_bytes),
            ConfigKey::UploadAllowedExtensions => config.upload.allowed_extensions.join(", "),
            ConfigKey::UploadVerifySignature => config.upload.verify_signature.to_string(),
            ConfigKey::LoggingFile => path_to_string(&config.logging.file),
        }
    }

    /// Set the value in a config file after validating it.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        self.validate(value)?;
        let value = value.trim();
        let failed = |reason: &str| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: reason.to_string(),
        };

        match self {
            ConfigKey::BackendUrl => {
                config.backend.url = value.trim_end_matches('/').to_string();
            }
            ConfigKey::BackendRequestTimeoutSecs => {
                config.backend.request_timeout_secs =
                    value.parse().map_err(|_| failed("must be a positive integer"))?;
            }
            ConfigKey::PollingIntervalMs => {
                let ms: u64 = value.parse().map_err(|_| failed("must be an integer"))?;
                config.polling.interval = Duration::from_millis(ms);
            }
            ConfigKey::ConnectivityTimeoutMs => {
                let ms: u64 = value.parse().map_err(|_| failed("must be an integer"))?;
                config.connectivity.timeout = Duration::from_millis(ms);
            }
            ConfigKey::UploadMaxSize => {
                config.upload.max_size_bytes = parse_size(value).map_err(|e| failed(&e.to_string()))?;
            }
            ConfigKey::UploadAllowedExtensions => {
                config.upload.allowed_extensions = parse_extensions(value);
            }
            ConfigKey::UploadVerifySignature => {
                config.upload.verify_signature = parse_bool(value);
            }
            ConfigKey::LoggingFile => {
                config.logging.file = expand_tilde(value);
            }
        }
        Ok(())
    }

    /// Validate a value according to this key's specification.
    pub fn validate(&self, value: &str) -> Result<(), ConfigKeyError> {
        self.specification()
            .is_satisfied_by(value.trim())
            .map_err(|reason| ConfigKeyError::ValidationFailed {
                key: self.name().to_string(),
                reason,
            })
    }

    /// Get the validation specification for this key.
    fn specification(&self) -> Box<dyn ValueSpecification> {
        match self {
            ConfigKey::BackendUrl => Box::new(UrlSpec),
            ConfigKey::BackendRequestTimeoutSecs => Box::new(PositiveIntegerSpec { min: 1 }),
            ConfigKey::PollingIntervalMs => Box::new(PositiveIntegerSpec {
                min: MIN_POLL_INTERVAL_MS,
            }),
            ConfigKey::ConnectivityTimeoutMs => Box::new(PositiveIntegerSpec { min: 1 }),
            ConfigKey::UploadMaxSize => Box::new(SizeSpec),
            ConfigKey::UploadAllowedExtensions => Box::new(ExtensionListSpec),
            ConfigKey::UploadVerifySignature => Box::new(BooleanSpec),
            ConfigKey::LoggingFile => Box::new(PathSpec),
        }
    }

    /// Get all supported configuration keys.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::BackendUrl,
            ConfigKey::BackendRequestTimeoutSecs,
            ConfigKey::PollingIntervalMs,
            ConfigKey::ConnectivityTimeoutMs,
            ConfigKey::UploadMaxSize,
            ConfigKey::UploadAllowedExtensions,
            ConfigKey::UploadVerifySignature,
            ConfigKey::LoggingFile,
        ]
    }
}

// ============================================================================
// Value Specifications (Specification Pattern)
// ============================================================================

/// Trait for value validation specifications.
trait ValueSpecification {
    /// Returns Ok(()) if valid, Err(reason) if invalid.
    fn is_satisfied_by(&self, value: &str) -> Result<(), String>;
}

/// Specification for size values (e.g., "2GB", "500MB").
struct SizeSpec;

impl ValueSpecification for SizeSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        parse_size(value)
            .map(|_| ())
            .map_err(|_| "must be a size like '2GB', '500MB', or '1024KB'".to_string())
    }
}

/// Specification for integers with a lower bound.
struct PositiveIntegerSpec {
    min: u64,
}

impl ValueSpecification for PositiveIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<u64>() {
            Ok(n) if n >= self.min => Ok(()),
            _ => Err(format!("must be an integer of at least {}", self.min)),
        }
    }
}

/// Specification for boolean values.
struct BooleanSpec;

impl ValueSpecification for BooleanSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let lower = value.to_lowercase();
        let valid = ["true", "false", "yes", "no", "1", "0", "on", "off"];
        if valid.contains(&lower.as_str()) {
            Ok(())
        } else {
            Err("must be true/false, yes/no, 1/0, or on/off".to_string())
        }
    }
}

/// Specification for path values (non-empty).
struct PathSpec;

impl ValueSpecification for PathSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            Err("must be a valid path".to_string())
        } else {
            Ok(())
        }
    }
}

/// Specification for HTTP URLs.
struct UrlSpec;

impl ValueSpecification for UrlSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.starts_with("http://") || value.starts_with("https://") {
            Ok(())
        } else {
            Err("must be a URL starting with 'http://' or 'https://'".to_string())
        }
    }
}

/// Specification for comma-separated extension lists.
struct ExtensionListSpec;

impl ValueSpecification for ExtensionListSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let extensions = parse_extensions(value);
        if extensions.is_empty() {
            return Err("must list at least one extension, e.g. 'mp4, mov'".to_string());
        }
        match extensions
            .iter()
            .find(|e| !e.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            Some(bad) => Err(format!("'{}' is not a valid extension", bad)),
            None => Ok(()),
        }
    }
}
