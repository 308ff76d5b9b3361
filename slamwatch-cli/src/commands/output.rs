//! Terminal formatting shared across commands.

use console::{style, Term};
use std::io;
use slamwatch::controller::{JobState, ProgressUpdate};
use slamwatch::detection::{DetectionSummary, FrameDetection};

/// Width of the textual progress bar.
const BAR_WIDTH: usize = 30;

/// Format a job state with color.
pub fn format_state(state: JobState) -> String {
    match state {
        JobState::Idle => format!("{}", style(state).dim()),
        JobState::Starting => format!("{}", style(state).blue()),
        JobState::Processing => format!("{}", style(state).yellow()),
        JobState::Completed => format!("{}", style(state).green()),
        JobState::Failed => format!("{}", style(state).red()),
    }
}

/// Format bytes into human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Render a fixed-width bar for a percentage in [0, 100].
pub fn progress_bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// One-line description of a progress update.
pub fn progress_line(update: &ProgressUpdate) -> String {
    format!(
        "{} {:>5.1}%  frame {}  detections {}  slam {}",
        progress_bar(update.progress_percent),
        update.progress_percent,
        update.frame,
        update.detections_count,
        update.slam_status
    )
}

/// Writes progress either in place (terminals) or one line per update.
pub struct ProgressPrinter {
    term: Term,
    in_place: bool,
    dirty: bool,
}

impl Default for ProgressPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressPrinter {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            in_place: atty::is(atty::Stream::Stdout),
            dirty: false,
        }
    }

    pub fn update(&mut self, update: &ProgressUpdate) -> io::Result<()> {
        let line = progress_line(update);
        if self.in_place {
            self.term.clear_line()?;
            self.term.write_str(&line)?;
            self.dirty = true;
            Ok(())
        } else {
            self.term.write_line(&line)
        }
    }

    /// End the in-place line so the next output starts fresh.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.dirty {
            self.term.write_line("")?;
            self.dirty = false;
        }
        Ok(())
    }
}

/// Print the results of a completed job.
pub fn print_summary(summary: &DetectionSummary) {
    println!("{}", style("Detection Summary").bold().underlined());
    if let Some(video) = &summary.video {
        println!("  {} {}", style("Video:").bold(), style(video).cyan());
    }
    println!(
        "  {} {}",
        style("Total detections:").bold(),
        style(summary.total_count).cyan()
    );
    println!(
        "  {} {} ({} with detections)",
        style("Frames processed:").bold(),
        summary.frames_processed,
        summary.frames.len()
    );
    if let Some(max) = summary.max_confidence() {
        println!("  {} {:.2}", style("Max confidence:").bold(), max);
    }

    if !summary.per_class.is_empty() {
        println!();
        println!("{}", style("Per Class").bold().underlined());
        let width = summary.per_class.keys().map(|k| k.len()).max().unwrap_or(0);
        for (class, stats) in &summary.per_class {
            println!(
                "  {:<width$}  {:>6}  max {:.2}",
                class,
                stats.count,
                stats.max_confidence,
                width = width
            );
        }
    }

    let perf = &summary.performance;
    println!();
    println!("{}", style("Performance").bold().underlined());
    println!("  {} {:.1}", style("Average FPS:").bold(), perf.avg_fps);
    println!(
        "  {} {:.2}",
        style("Average confidence:").bold(),
        perf.avg_confidence
    );
    println!(
        "  {} {:.1}s",
        style("Processing time:").bold(),
        perf.processing_time_ms / 1000.0
    );
    println!(
        "  {} {:.1}s",
        style("Video duration:").bold(),
        perf.video_duration_sec
    );
}

/// Print the detections of a single frame.
pub fn print_frame(frame: &FrameDetection) {
    println!(
        "{} {} at {:.2}s: {} detection(s)",
        style("Frame").bold(),
        style(frame.frame_number).yellow(),
        frame.timestamp_sec,
        frame.count
    );

    for detection in &frame.detections {
        let b = &detection.bbox;
        print!(
            "  {:<12} {:.2}  box ({:.0}, {:.0}) {:.0}x{:.0}",
            style(&detection.class_name).cyan(),
            detection.confidence,
            b.x,
            b.y,
            b.width,
            b.height
        );
        if let Some(thermal) = &detection.thermal_signature {
            print!(
                "  thermal mean {:.1} max {:.1}",
                thermal.mean_temp, thermal.max_temp
            );
        }
        println!();
    }
}
