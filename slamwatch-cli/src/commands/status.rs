//! Status command - show what the backend is doing right now.

use console::style;
use slamwatch::backend::DetectionBackend;

use super::output::{format_bytes, progress_bar};
use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Run the status command.
pub async fn run(options: &GlobalOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("status");

    let backend = runner.create_backend()?;
    let status = backend.processing_status().await?;

    let state = if status.is_processing {
        style("processing").yellow()
    } else if status.progress >= 100.0 {
        style("finished").green()
    } else {
        style("idle").dim()
    };

    println!("{}", style("Backend Status").bold().underlined());
    println!("  {} {}", style("State:").bold(), state);
    println!(
        "  {} {} {:.1}%",
        style("Progress:").bold(),
        progress_bar(status.progress),
        status.progress
    );
    println!(
        "  {} {}",
        style("Detections:").bold(),
        status.detections_count
    );
    println!("  {} {}", style("SLAM:").bold(), status.slam_status);

    match &status.current_video {
        Some(video) => {
            println!(
                "  {} {} ({})",
                style("Video:").bold(),
                style(&video.filename).cyan(),
                format_bytes(video.size)
            );
            if let Some(uploaded) = video.uploaded_at() {
                println!(
                    "  {} {}",
                    style("Uploaded:").bold(),
                    uploaded.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
        }
        None => println!("  {} (none)", style("Video:").bold()),
    }

    Ok(())
}
