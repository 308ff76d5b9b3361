//! Health command - check that the backend answers in time.

use console::style;
use slamwatch::connectivity::{Connectivity, ConnectivityMonitor};
use slamwatch::error::JobError;

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Run the health command.
pub async fn run(options: &GlobalOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("health");
    let config = runner.config();

    let backend = runner.create_backend()?;
    let monitor = ConnectivityMonitor::new(backend, config.connectivity.timeout);

    println!("Checking {} ...", config.backend.url);
    let result = monitor.probe().await;
    let latency_ms = monitor
        .last_probe()
        .map(|p| p.latency.as_millis())
        .unwrap_or_default();

    match result {
        Connectivity::Available => {
            println!(
                "{} Backend is reachable ({} ms)",
                style("✓").green(),
                latency_ms
            );
            Ok(())
        }
        Connectivity::Unavailable(reason) => {
            println!("{} Backend is unavailable: {}", style("✗").red(), reason);
            Err(CliError::Job(JobError::BackendUnavailable(reason)))
        }
    }
}
