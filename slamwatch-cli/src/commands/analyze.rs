//! Analyze command - upload a video and follow processing to completion.

use console::style;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use slamwatch::controller::JobEvent;
use slamwatch::error::JobError;
use slamwatch::upload::VideoFile;

use super::output::{format_bytes, format_state, print_summary, ProgressPrinter};
use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Arguments for the analyze command.
pub struct AnalyzeArgs {
    pub file: String,
    pub interval_ms: Option<u64>,
    pub no_wait: bool,
}

/// Run the analyze command.
pub async fn run(options: &GlobalOptions, args: AnalyzeArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("analyze");

    let controller = runner.create_controller(args.interval_ms)?;
    let video = VideoFile::from_path(&args.file)
        .await
        .map_err(JobError::from)?;

    // Subscribe first so no event between upload and start is missed.
    let mut events = controller.subscribe();

    println!(
        "Uploading {} ({})...",
        style(video.name()).cyan(),
        format_bytes(video.size_bytes())
    );
    let asset = controller.submit_video(&video).await?;
    println!(
        "{} Uploaded as {}",
        style("✓").green(),
        style(&asset.backend_path).dim()
    );

    let job_id = controller.start().await?;
    println!("{} Processing started ({})", style("✓").green(), job_id);

    if args.no_wait {
        println!("Not waiting for completion; run 'slamwatch status' to check progress.");
        return Ok(());
    }

    println!("Press Ctrl+C to stop following (processing continues on the backend)");
    println!();

    let mut printer = ProgressPrinter::new();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let event = tokio::select! {
            biased;
            _ = &mut ctrl_c => {
                let _ = printer.finish();
                return Err(CliError::Interrupted);
            }
            event = events.recv() => event,
        };

        match event {
            Ok(JobEvent::Progress(update)) if update.job_id == job_id => {
                if let Err(e) = printer.update(&update) {
                    debug!(error = %e, "Failed to draw progress");
                }
            }
            Ok(JobEvent::StateChanged { from, to }) => {
                debug!(from = %from, to = %to, "Job state changed");
            }
            Ok(JobEvent::Completed(summary)) => {
                let _ = printer.finish();
                println!(
                    "{} Job {}",
                    style("✓").green(),
                    format_state(controller.state())
                );
                println!();
                print_summary(&summary);
                return Ok(());
            }
            Ok(JobEvent::Failed(info)) => {
                let _ = printer.finish();
                println!(
                    "{} Job {}",
                    style("✗").red(),
                    format_state(controller.state())
                );
                return Err(CliError::Job(info.error));
            }
            Ok(JobEvent::SummaryUnavailable(info)) => {
                let _ = printer.finish();
                warn!(error = %info, "Summary fetch failed after completion, retrying once");
                println!("Processing completed; fetching results again...");
                let summary = controller.summary().await?;
                println!();
                print_summary(&summary);
                return Ok(());
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "Progress display fell behind");
            }
            Err(RecvError::Closed) => {
                let _ = printer.finish();
                return Ok(());
            }
        }
    }
}
