//! Frame command - show the detections recorded for one frame.
//!
//! Reads the backend's current results directly; no job needs to have been
//! started from this process.

use slamwatch::backend::DetectionBackend;

use super::output::print_frame;
use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Run the frame command.
pub async fn run(options: &GlobalOptions, frame_number: u64) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("frame");

    let backend = runner.create_backend()?;
    match backend.frame_detections(frame_number).await {
        Ok(frame) => {
            print_frame(&frame);
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            println!("No detections recorded for frame {}", frame_number);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
