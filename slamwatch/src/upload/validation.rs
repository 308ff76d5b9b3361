//! Local upload checks, run before anything is sent.

use super::{UploadError, VideoFile};

/// Default upload size limit (500MB, the backend's own limit).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// Default accepted extensions.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm", "m4v"];

/// Character sequences rejected in file names.
const SUSPICIOUS_NAME_PATTERNS: &[&str] = &["..", "/", "\\", "<", ">", "|", ":", "*", "?", "\""];

/// How many leading bytes are searched for a container signature.
const SIGNATURE_WINDOW: usize = 20;

/// EBML magic shared by Matroska and WebM.
const EBML_MAGIC: &[u8] = &[0x1a, 0x45, 0xdf, 0xa3];

/// Limits an upload must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConstraints {
    pub max_size_bytes: u64,
    /// Lowercase extensions without the dot.
    pub allowed_extensions: Vec<String>,
    /// Require a recognizable container signature in the first bytes.
    pub verify_signature: bool,
}

impl Default for UploadConstraints {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            verify_signature: false,
        }
    }
}

impl UploadConstraints {
    fn allows_extension(&self, ext: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Check a file against the constraints.
pub fn validate(file: &VideoFile, constraints: &UploadConstraints) -> Result<(), UploadError> {
    let name = file.name();
    if name.trim().is_empty() {
        return Err(UploadError::Validation("no file name provided".to_string()));
    }
    if SUSPICIOUS_NAME_PATTERNS.iter().any(|p| name.contains(p)) {
        return Err(UploadError::Validation(format!(
            "file name {:?} contains suspicious characters",
            name
        )));
    }

    if file.size_bytes() == 0 {
        return Err(UploadError::Validation(format!("{} is empty", name)));
    }

    match file.extension() {
        Some(ext) if constraints.allows_extension(&ext) => {}
        other => {
            return Err(UploadError::Validation(format!(
                "unsupported file type {}; allowed: {}",
                other.map_or_else(|| "(none)".to_string(), |e| format!(".{}", e)),
                constraints.allowed_extensions.join(", ")
            )))
        }
    }

    if !file.media_type().starts_with("video/") {
        return Err(UploadError::Validation(format!(
            "{} is not a video (media type {})",
            name,
            file.media_type()
        )));
    }

    if file.size_bytes() > constraints.max_size_bytes {
        return Err(UploadError::Validation(format!(
            "file too large: {:.1}MB, maximum {:.0}MB",
            file.size_bytes() as f64 / (1024.0 * 1024.0),
            constraints.max_size_bytes as f64 / (1024.0 * 1024.0)
        )));
    }

    if constraints.verify_signature && !has_video_signature(file.bytes()) {
        return Err(UploadError::Validation(format!(
            "{} does not look like a video container",
            name
        )));
    }

    Ok(())
}

/// Look for a known container signature near the start of the file.
pub fn has_video_signature(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(SIGNATURE_WINDOW)];

    let mp4_like = contains(window, b"ftyp");
    let avi = window.starts_with(b"RIFF") && contains(window, b"AVI ");
    let matroska = contains(window, EBML_MAGIC);

    mp4_like || avi || matroska
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
