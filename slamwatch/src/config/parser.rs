//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::time::Duration;

use super::defaults::MIN_POLL_INTERVAL_MS;
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use super::size::parse_size;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [backend] section
    if let Some(section) = ini.section(Some("backend")) {
        if let Some(v) = section.get("url") {
            let v = v.trim().trim_end_matches('/');
            if !v.starts_with("http://") && !v.starts_with("https://") {
                return Err(invalid("backend", "url", v, "must start with http:// or https://"));
            }
            config.backend.url = v.to_string();
        }
        if let Some(v) = section.get("request_timeout_secs") {
            config.backend.request_timeout_secs =
                parse_positive(v).ok_or_else(|| {
                    invalid("backend", "request_timeout_secs", v, "must be a positive integer")
                })?;
        }
    }

    // [polling] section
    if let Some(section) = ini.section(Some("polling")) {
        if let Some(v) = section.get("interval_ms") {
            let ms = v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms >= MIN_POLL_INTERVAL_MS)
                .ok_or_else(|| {
                    invalid(
                        "polling",
                        "interval_ms",
                        v,
                        &format!("must be an integer of at least {}", MIN_POLL_INTERVAL_MS),
                    )
                })?;
            config.polling.interval = Duration::from_millis(ms);
        }
    }

    // [connectivity] section
    if let Some(section) = ini.section(Some("connectivity")) {
        if let Some(v) = section.get("timeout_ms") {
            let ms = parse_positive(v).ok_or_else(|| {
                invalid("connectivity", "timeout_ms", v, "must be a positive integer")
            })?;
            config.connectivity.timeout = Duration::from_millis(ms);
        }
    }

    // [upload] section
    if let Some(section) = ini.section(Some("upload")) {
        if let Some(v) = section.get("max_size") {
            config.upload.max_size_bytes = parse_size(v).map_err(|_| {
                invalid(
                    "upload",
                    "max_size",
                    v,
                    "expected format like '500MB', '2GB', or '1024KB'",
                )
            })?;
        }
        if let Some(v) = section.get("allowed_extensions") {
            let extensions = parse_extensions(v);
            if extensions.is_empty() {
                return Err(invalid(
                    "upload",
                    "allowed_extensions",
                    v,
                    "must list at least one extension",
                ));
            }
            config.upload.allowed_extensions = extensions;
        }
        if let Some(v) = section.get("verify_signature") {
            config.upload.verify_signature = parse_bool(v);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_positive(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|n| *n > 0)
}

/// Split a comma-separated extension list, normalizing case and leading dots.
pub(super) fn parse_extensions(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Parse a boolean value from a string.
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
