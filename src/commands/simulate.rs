//! `daytime simulate`: run the scheduler against an accelerated clock.
//!
//! The simulated clock starts at the given time and flows `multiplier` times
//! faster than real time. Messages go to the log instead of a broker, and
//! every log line carries the simulated time.

use anyhow::{Result, anyhow};
use std::sync::Arc;

use crate::Daytime;
use crate::logger::Log;
use crate::time_source::{SimulatedTimeSource, TimeSource, parse_datetime};

/// Run a simulation until `end_time` (if given) or Ctrl+C.
///
/// # Arguments
/// * `start_time` - Start time in format "YYYY-MM-DD HH:MM:SS"
/// * `end_time` - Optional end time in the same format
/// * `multiplier` - Time acceleration factor
/// * `debug_enabled` - Whether debug mode is enabled
pub fn run_simulate_command(
    start_time: &str,
    end_time: Option<&str>,
    multiplier: f64,
    debug_enabled: bool,
) -> Result<()> {
    let start = parse_datetime(start_time).map_err(|e| anyhow!("Invalid start time: {e}"))?;
    let end = end_time
        .map(|end| parse_datetime(end).map_err(|e| anyhow!("Invalid end time: {e}")))
        .transpose()?;

    if let Some(end) = end
        && end <= start
    {
        anyhow::bail!("End time must be after start time");
    }

    let source = SimulatedTimeSource::new(start, multiplier);
    let actual_multiplier = source.multiplier();
    let clock: Arc<dyn TimeSource> = Arc::new(source);

    // Register the clock before the first line so every line is stamped
    Log::set_simulated_clock(Some(Arc::clone(&clock)));

    log_version!();
    log_block_start!("Simulation Mode");
    match end {
        Some(end) => {
            let duration = end.signed_duration_since(start);
            log_decorated!(
                "Simulating from {} to {}",
                start.format("%Y-%m-%d %H:%M:%S"),
                end.format("%Y-%m-%d %H:%M:%S")
            );
            log_indented!(
                "Total simulated time: {} hours {} minutes",
                duration.num_hours(),
                duration.num_minutes() % 60
            );
            log_indented!(
                "Time acceleration: {}x (will complete in ~{:.1} seconds)",
                actual_multiplier,
                duration.num_seconds() as f64 / actual_multiplier
            );
        }
        None => {
            log_decorated!(
                "Simulating from {} until interrupted",
                start.format("%Y-%m-%d %H:%M:%S")
            );
            log_indented!("Time acceleration: {}x", actual_multiplier);
        }
    }

    let mut app = Daytime::new(debug_enabled).without_headers().with_clock(clock);
    if let Some(end) = end {
        app = app.until(end);
    }
    let result = app.run();

    Log::set_simulated_clock(None);
    result
}

pub fn display_help() {
    log_version!();
    log_block_start!("simulate - Run the scheduler with simulated time");
    log_block_start!("Usage: daytime simulate <start> [end] [multiplier]");
    log_block_start!("Arguments:");
    log_indented!("start       Simulated start time, \"YYYY-MM-DD HH:MM:SS\"");
    log_indented!("end         Optional end time, same format (default: run until Ctrl+C)");
    log_indented!("multiplier  Simulated seconds per real second (default: 3600)");
    log_block_start!("Options:");
    log_indented!("-l, --log <file>     Write output to a file");
    log_indented!("-c, --config <dir>   Use custom configuration directory");
    log_block_start!("Notes:");
    log_indented!("Messages are logged instead of published to the broker");
    log_block_start!("Examples:");
    log_indented!("daytime simulate \"2024-06-21 00:00:00\" \"2024-06-23 00:00:00\"");
    log_indented!("daytime simulate \"2024-12-21 12:00:00\" 600 --log sim.log");
    log_end!();
}
