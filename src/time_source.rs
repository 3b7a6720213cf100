//! Time source abstraction for supporting both real-time and simulated time.
//!
//! The scheduler never reads the system clock directly. It asks its injected
//! [`TimeSource`] what time it is and how long a wait really lasts, which lets
//! the `simulate` command (and the tests) run whole days of transitions in
//! seconds.

use chrono::{DateTime, Duration as ChronoDuration, Local, TimeZone};
use std::time::{Duration as StdDuration, Instant};

/// Trait for abstracting time operations
pub trait TimeSource: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Local>;

    /// Convert a wait measured in this source's time into wall-clock time.
    fn real_duration(&self, duration: StdDuration) -> StdDuration;

    /// Check if this is a simulated time source
    fn is_simulated(&self) -> bool;
}

/// Real-time implementation that uses actual system time
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn real_duration(&self, duration: StdDuration) -> StdDuration {
        duration
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Simulated time source with linear acceleration.
///
/// Simulated time starts at `start_time` when the source is created and
/// flows `multiplier` times faster than wall-clock time from then on.
#[derive(Debug, Clone)]
pub struct SimulatedTimeSource {
    /// The starting time for the simulation
    start_time: DateTime<Local>,
    /// Wall-clock anchor matching `start_time`
    started: Instant,
    /// Time acceleration factor (e.g., 60.0 = 1 minute per second)
    time_multiplier: f64,
}

impl SimulatedTimeSource {
    /// Create a new simulated time source
    ///
    /// # Arguments
    /// * `start_time` - Starting time for the simulation
    /// * `multiplier` - Time acceleration (e.g., 60.0 = 1 simulated minute per real second).
    ///   Non-positive or non-finite values fall back to 1 hour per second.
    pub fn new(start_time: DateTime<Local>, multiplier: f64) -> Self {
        Self {
            start_time,
            started: Instant::now(),
            time_multiplier: if multiplier.is_finite() && multiplier > 0.0 {
                multiplier
            } else {
                crate::common::constants::DEFAULT_SIMULATION_MULTIPLIER
            },
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.time_multiplier
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Local> {
        let simulated_secs = self.started.elapsed().as_secs_f64() * self.time_multiplier;
        let simulated_elapsed = ChronoDuration::seconds(simulated_secs as i64)
            + ChronoDuration::nanoseconds((simulated_secs.fract() * 1_000_000_000.0) as i64);
        self.start_time + simulated_elapsed
    }

    fn real_duration(&self, duration: StdDuration) -> StdDuration {
        StdDuration::from_secs_f64(duration.as_secs_f64() / self.time_multiplier)
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Parse a datetime string in the format "YYYY-MM-DD HH:MM:SS"
pub fn parse_datetime(s: &str) -> Result<DateTime<Local>, String> {
    use chrono::NaiveDateTime;

    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))
        .and_then(|naive| {
            Local
                .from_local_datetime(&naive)
                .single()
                .ok_or_else(|| "Ambiguous or invalid local time".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_time_source_passes_durations_through() {
        let source = RealTimeSource;
        assert!(!source.is_simulated());
        assert_eq!(
            source.real_duration(StdDuration::from_secs(90)),
            StdDuration::from_secs(90)
        );
    }

    #[test]
    fn test_simulated_time_scales_waits() {
        let start = parse_datetime("2024-06-21 00:00:00").unwrap();
        let source = SimulatedTimeSource::new(start, 3600.0);
        assert!(source.is_simulated());
        assert_eq!(
            source.real_duration(StdDuration::from_secs(7200)),
            StdDuration::from_secs(2)
        );
    }

    #[test]
    fn test_simulated_time_moves_forward_from_start() {
        let start = parse_datetime("2024-06-21 00:00:00").unwrap();
        let source = SimulatedTimeSource::new(start, 3600.0);
        std::thread::sleep(StdDuration::from_millis(20));
        let now = source.now();
        assert!(now > start);
        // 20ms of real time is ~72 simulated seconds; allow generous slack
        assert!(now < start + ChronoDuration::hours(1));
    }

    #[test]
    fn test_invalid_multiplier_falls_back() {
        let start = parse_datetime("2024-06-21 00:00:00").unwrap();
        assert_eq!(SimulatedTimeSource::new(start, 0.0).multiplier(), 3600.0);
        assert_eq!(SimulatedTimeSource::new(start, f64::NAN).multiplier(), 3600.0);
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        assert!(parse_datetime("2024-06-21T00:00:00").is_err());
        assert!(parse_datetime("yesterday").is_err());
    }
}
