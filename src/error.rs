//! Error taxonomy for the daytime service.
//!
//! Startup errors abort the service. Steady-state errors (publish failures,
//! fire-time calculation failures) are logged by the scheduler and never
//! propagate out of the worker.

use chrono::NaiveDate;
use thiserror::Error;

/// Top-level error returned by the scheduler and the transport constructors.
#[derive(Debug, Error)]
pub enum DaytimeError {
    /// Invalid configuration or unreachable transport target.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The solar model could not resolve sunrise or sunset.
    #[error(transparent)]
    Calculation(#[from] CalculationError),

    /// The transport accepted the call but delivery failed.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Neither the given date nor the following one produced a boundary
    /// after the reference time.
    #[error("no upcoming sunrise or sunset could be computed after {date}")]
    SchedulingGap { date: NaiveDate },
}

/// Failures of the solar-position calculation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalculationError {
    #[error("invalid coordinates: lat={latitude}, lon={longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// Polar day or polar night: the sun does not cross the horizon on this date.
    #[error("no {event} occurs on {date} at lat={latitude:.4}, lon={longitude:.4}")]
    NoEvent {
        event: &'static str,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
    },

    #[error("date {0} is outside the supported calendar range")]
    DateOutOfRange(NaiveDate),
}

/// Failures reported by a [`crate::transport::Publisher`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PublishError {
    #[error("transport is not connected")]
    Disconnected,

    #[error("failed to publish to '{topic}': {reason}")]
    Rejected { topic: String, reason: String },

    #[error("failed to close transport: {0}")]
    Close(String),
}
