//! Raw sunrise/sunset calculation.
//!
//! The [`SolarModel`] trait is the seam between the transition calculator and
//! the astronomy. [`SunriseModel`] is the production implementation backed by
//! the `sunrise` crate; tests substitute fixed models.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sunrise::{Coordinates, SolarDay, SolarEvent};

use crate::error::CalculationError;

/// Unadjusted astronomical sunrise and sunset for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SunTimes {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

/// Source of raw sunrise/sunset times.
///
/// Implementations must be pure: the same (date, latitude, longitude) always
/// yields the same result.
pub trait SolarModel: Send + Sync {
    fn sun_times(
        &self,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> Result<SunTimes, CalculationError>;
}

/// Events further than this from the requested date's midnight (UTC) are not
/// genuine sunrises or sunsets for that date.
const EVENT_WINDOW_HOURS: i64 = 48;

/// Solar model backed by the `sunrise` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SunriseModel;

impl SolarModel for SunriseModel {
    fn sun_times(
        &self,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> Result<SunTimes, CalculationError> {
        let coord = Coordinates::new(latitude, longitude).ok_or(
            CalculationError::InvalidCoordinates {
                latitude,
                longitude,
            },
        )?;
        let anchor = date
            .and_hms_opt(0, 0, 0)
            .ok_or(CalculationError::DateOutOfRange(date))?
            .and_utc();

        let solar_day = SolarDay::new(coord, date);
        let sunrise = solar_day.event_time(SolarEvent::Sunrise);
        let sunset = solar_day.event_time(SolarEvent::Sunset);

        // Polar day/night leaves the hour angle undefined and the crate
        // degrades to a timestamp nowhere near the requested date.
        let no_event = |event: &'static str| CalculationError::NoEvent {
            event,
            date,
            latitude,
            longitude,
        };
        if !within_window(sunrise, anchor) {
            return Err(no_event("sunrise"));
        }
        if !within_window(sunset, anchor) || sunset <= sunrise {
            return Err(no_event("sunset"));
        }

        Ok(SunTimes { sunrise, sunset })
    }
}

fn within_window(event: DateTime<Utc>, anchor: DateTime<Utc>) -> bool {
    let window = Duration::hours(EVENT_WINDOW_HOURS);
    event > anchor - window && event < anchor + window
}
