//! slamwatch CLI - Command-line interface
//!
//! This binary drives a CV/SLAM detection backend through the slamwatch
//! library: upload a video, follow processing, and inspect detections.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use error::CliError;
use runner::GlobalOptions;

#[derive(Parser)]
#[command(name = "slamwatch")]
#[command(version = slamwatch::VERSION)]
#[command(about = "Submit videos to a CV/SLAM detection backend and follow the results", long_about = None)]
struct Cli {
    /// Backend base URL (overrides backend.url in config.ini)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Enable debug logging (also mirrored to stderr)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend is reachable
    Health,

    /// Show the backend's current processing status
    Status,

    /// Upload a video, start processing, and follow it to completion
    Analyze {
        /// Video file to upload
        file: String,

        /// Delay between status requests in milliseconds (overrides polling.interval_ms)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Return once processing has started instead of following it
        #[arg(long)]
        no_wait: bool,
    },

    /// Show the detections recorded for one frame
    Frame {
        /// Frame number
        number: u64,
    },

    /// View and modify configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let options = GlobalOptions {
        backend_url: cli.backend_url,
        debug: cli.debug,
    };

    let result: Result<(), CliError> = match cli.command {
        Commands::Health => commands::health::run(&options).await,
        Commands::Status => commands::status::run(&options).await,
        Commands::Analyze {
            file,
            interval_ms,
            no_wait,
        } => {
            commands::analyze::run(
                &options,
                commands::analyze::AnalyzeArgs {
                    file,
                    interval_ms,
                    no_wait,
                },
            )
            .await
        }
        Commands::Frame { number } => commands::frame::run(&options, number).await,
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
