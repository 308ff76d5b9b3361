//! Detection data model.
//!
//! Types describing what the backend detected in a processed video. They are
//! decoded from the backend's JSON payloads and normalized on the way in:
//!
//! - bounding boxes arrive as corner pairs `[x1, y1, x2, y2]` and are stored
//!   as origin plus extent
//! - a frame's detection count is always recomputed from its detection list
//! - missing summary sections fall back to empty or zeroed values
//!
//! These types are immutable once constructed and are shared through `Arc`
//! by the controller and result aggregator.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f64; 4]")]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Build a box from its top-left and bottom-right corners.
    ///
    /// Corners given in the wrong order are swapped, so the extent is never
    /// negative.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let (left, right) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (top, bottom) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        Self {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }

    /// Area in square pixels.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Center point `(x, y)`.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(corners: [f64; 4]) -> Self {
        Self::from_corners(corners[0], corners[1], corners[2], corners[3])
    }
}

/// Thermal statistics of the region covered by a detection.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ThermalSignature {
    #[serde(default)]
    pub mean_temp: f64,
    #[serde(default)]
    pub max_temp: f64,
    #[serde(default)]
    pub area: f64,
}

/// One detected object in one frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DetectionResult {
    pub bbox: BoundingBox,
    pub confidence: f64,
    #[serde(default)]
    pub class_id: i64,
    pub class_name: String,
    #[serde(default)]
    pub thermal_signature: Option<ThermalSignature>,
}

/// Wire shape of a frame record.
#[derive(Deserialize)]
struct RawFrame {
    frame_number: u64,
    #[serde(default, alias = "timestamp_sec")]
    timestamp: f64,
    #[serde(default)]
    detections: Vec<DetectionResult>,
}

/// Detections recorded for one video frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawFrame")]
pub struct FrameDetection {
    pub frame_number: u64,
    pub timestamp_sec: f64,
    pub detections: Vec<DetectionResult>,
    /// Always equal to `detections.len()`.
    pub count: u64,
}

impl FrameDetection {
    pub fn new(frame_number: u64, timestamp_sec: f64, detections: Vec<DetectionResult>) -> Self {
        let count = detections.len() as u64;
        Self {
            frame_number,
            timestamp_sec,
            detections,
            count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

impl From<RawFrame> for FrameDetection {
    fn from(raw: RawFrame) -> Self {
        Self::new(raw.frame_number, raw.timestamp, raw.detections)
    }
}

/// Per-class aggregate over a whole video.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct ClassSummary {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub max_confidence: f64,
}

impl ClassSummary {
    fn record(&mut self, confidence: f64) {
        self.count += 1;
        if confidence > self.max_confidence {
            self.max_confidence = confidence;
        }
    }
}

/// Timing and throughput figures reported for a processing run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct PerformanceMetrics {
    pub avg_fps: f64,
    pub avg_confidence: f64,
    pub processing_time_ms: f64,
    pub video_duration_sec: f64,
    pub total_detections: u64,
    pub frames_processed: u64,
}

/// Wire shape of the results payload.
#[derive(Deserialize)]
struct RawSummary {
    #[serde(default)]
    detections: Vec<FrameDetection>,
    #[serde(default)]
    total_count: Option<u64>,
    #[serde(default)]
    frames_processed: Option<u64>,
    #[serde(default)]
    video: Option<String>,
    #[serde(default)]
    summary: BTreeMap<String, ClassSummary>,
    #[serde(default)]
    performance: Option<PerformanceMetrics>,
}

/// Aggregate results of a completed processing run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawSummary")]
pub struct DetectionSummary {
    /// Recent frame records reported by the backend, in frame order.
    ///
    /// The backend keeps a bounded history, so this may include frames
    /// without detections and need not cover the whole video.
    pub frames: Vec<FrameDetection>,
    /// Total detections across all frames.
    pub total_count: u64,
    /// Frames the backend processed (including frames without detections).
    pub frames_processed: u64,
    /// Per-class counts keyed by class name.
    pub per_class: BTreeMap<String, ClassSummary>,
    pub performance: PerformanceMetrics,
    /// Name of the processed video, when reported.
    pub video: Option<String>,
}

impl From<RawSummary> for DetectionSummary {
    fn from(raw: RawSummary) -> Self {
        let mut frames = raw.detections;
        frames.sort_by_key(|f| f.frame_number);

        let counted: u64 = frames.iter().map(|f| f.count).sum();
        let total_count = raw.total_count.unwrap_or(counted);

        let frames_processed = raw
            .frames_processed
            .or_else(|| raw.performance.map(|p| p.frames_processed))
            .filter(|&n| n > 0)
            .unwrap_or(frames.len() as u64);

        let per_class = if raw.summary.is_empty() {
            per_class_from_frames(&frames)
        } else {
            raw.summary
        };

        Self {
            frames,
            total_count,
            frames_processed,
            per_class,
            performance: raw.performance.unwrap_or_default(),
            video: raw.video.filter(|v| !v.is_empty()),
        }
    }
}

fn per_class_from_frames(frames: &[FrameDetection]) -> BTreeMap<String, ClassSummary> {
    let mut per_class: BTreeMap<String, ClassSummary> = BTreeMap::new();
    for detection in frames.iter().flat_map(|f| &f.detections) {
        per_class
            .entry(detection.class_name.clone())
            .or_default()
            .record(detection.confidence);
    }
    per_class
}

impl DetectionSummary {
    /// Returns true when nothing was detected.
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// Look up the detections recorded for a frame.
    pub fn frame(&self, frame_number: u64) -> Option<&FrameDetection> {
        self.frames
            .binary_search_by_key(&frame_number, |f| f.frame_number)
            .ok()
            .map(|i| &self.frames[i])
    }

    /// Highest confidence of any detection, if there is one.
    pub fn max_confidence(&self) -> Option<f64> {
        self.frames
            .iter()
            .flat_map(|f| &f.detections)
            .map(|d| d.confidence)
            .fold(None, |best: Option<f64>, c| Some(best.map_or(c, |b| b.max(c))))
    }
}
