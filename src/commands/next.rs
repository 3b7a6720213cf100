//! `daytime next`: print the current status and the upcoming transition.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::common::constants::NEXT_TIME_FORMAT;
use crate::common::utils::format_duration;
use crate::config;
use crate::geo::{Calculation, Calculator, Status};
use crate::logger::Log;

/// Everything `next` reports, in the shape printed by `--json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextReport {
    pub current_status: Status,
    pub next_status: Status,
    /// Same rendering as the next-time topic
    pub next_time: String,
    pub next_time_utc: DateTime<Utc>,
    pub seconds_until: i64,
    pub date: NaiveDate,
    pub sunrise: String,
    pub sunset: String,
    pub adjusted_sunrise: String,
    pub adjusted_sunset: String,
    pub offset_minutes: i64,
    pub inverted_window: bool,
}

impl NextReport {
    pub fn new<Tz: TimeZone>(calculation: &Calculation, offset_minutes: i64, now: &DateTime<Tz>) -> Self {
        let transition = calculation.transition;
        let boundaries = &calculation.boundaries;
        let local = |at: DateTime<Utc>| at.with_timezone(&Local).format(NEXT_TIME_FORMAT).to_string();

        Self {
            current_status: transition.status.complement(),
            next_status: transition.status,
            next_time: transition.render(),
            next_time_utc: transition.at,
            seconds_until: (transition.at - now.with_timezone(&Utc)).num_seconds(),
            date: boundaries.date,
            sunrise: local(boundaries.raw.sunrise),
            sunset: local(boundaries.raw.sunset),
            adjusted_sunrise: local(boundaries.adjusted_sunrise),
            adjusted_sunset: local(boundaries.adjusted_sunset),
            offset_minutes,
            inverted_window: boundaries.is_inverted(),
        }
    }
}

/// Compute and print the next transition for the configured location.
pub fn run_next_command(debug_enabled: bool, json: bool) -> Result<()> {
    let config = config::load()?;
    let calculator = Calculator::with_sunrise_model(config.location()?, config.offset());
    let now = Local::now();
    let calculation = calculator
        .calculate(&now)
        .context("Failed to calculate the next transition")?;
    let report = NextReport::new(&calculation, config.offset_minutes(), &now);

    if json {
        Log::set_enabled(false);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    log_version!();
    log_block_start!("Current status: {}", report.current_status);
    log_decorated!(
        "Next: {} at {} (in {})",
        report.next_status,
        report.next_time,
        format_duration(std::time::Duration::from_secs(
            report.seconds_until.max(0) as u64
        ))
    );
    log_block_start!("Solar times for {}:", report.date);
    log_indented!(
        "Sunrise: {} (Daytime from {})",
        report.sunrise,
        report.adjusted_sunrise
    );
    log_indented!(
        "Sunset:  {} (Nighttime from {})",
        report.sunset,
        report.adjusted_sunset
    );
    log_indented!("Offset:  {} minutes", report.offset_minutes);
    if report.inverted_window {
        log_pipe!();
        log_warning!("The offset leaves no daytime window on {}", report.date);
    }
    if debug_enabled {
        log_pipe!();
        log_debug!("Next transition (UTC): {}", report.next_time_utc);
    }
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("next - Show the current status and the next transition");
    log_block_start!("Usage: daytime next [OPTIONS]");
    log_block_start!("Options:");
    log_indented!("-j, --json           Output in JSON format");
    log_indented!("-c, --config <dir>   Use custom configuration directory");
    log_block_start!("Examples:");
    log_indented!("daytime next");
    log_indented!("daytime next --json");
    log_end!();
}
