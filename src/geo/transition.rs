//! Next-transition calculation with the daylight safety offset.
//!
//! This module turns raw sunrise/sunset times into the single piece of
//! information the scheduler needs: which status becomes active next, and
//! when. Sunrise is pushed later and sunset pulled earlier by the configured
//! offset, shrinking the daytime window to account for ambient light around
//! the astronomical events.
//!
//! All comparisons happen on `DateTime<Utc>`, so boundaries that fall on the
//! next UTC day (sunset west of Greenwich, for example) need no special
//! handling. The calendar date fed to the solar model is the date of `now`
//! in `now`'s own timezone. Callers pass `now` in a zone close to the
//! location's own: a host zone far from the location's longitude can pick a
//! date whose boundaries skip that evening's sunset.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration as StdDuration;

use crate::common::constants::NEXT_TIME_FORMAT;
use crate::error::{CalculationError, DaytimeError};
use crate::geo::solar::{SolarModel, SunTimes, SunriseModel};

/// Day/night status published on the status topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    Daytime,
    Nighttime,
}

impl Status {
    /// Payload string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Daytime => "Daytime",
            Status::Nighttime => "Nighttime",
        }
    }

    /// The other status.
    pub fn complement(self) -> Self {
        match self {
            Status::Daytime => Status::Nighttime,
            Status::Nighttime => Status::Daytime,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The next status to become active and the instant it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub status: Status,
    pub at: DateTime<Utc>,
}

impl Transition {
    /// The transition instant in the host's local timezone.
    pub fn local_time(&self) -> DateTime<Local> {
        self.at.with_timezone(&Local)
    }

    /// Payload for the next-time topic.
    pub fn render(&self) -> String {
        self.local_time().format(NEXT_TIME_FORMAT).to_string()
    }

    /// Time left until this transition, zero if it is already due.
    pub fn duration_from(&self, now: DateTime<Utc>) -> StdDuration {
        (self.at - now).to_std().unwrap_or(StdDuration::ZERO)
    }
}

/// Fixed observer position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Offset-adjusted boundaries for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBoundaries {
    pub date: NaiveDate,
    pub raw: SunTimes,
    pub adjusted_sunrise: DateTime<Utc>,
    pub adjusted_sunset: DateTime<Utc>,
}

impl DayBoundaries {
    fn from_sun_times(date: NaiveDate, raw: SunTimes, offset: Duration) -> Self {
        Self {
            date,
            raw,
            adjusted_sunrise: raw.sunrise + offset,
            adjusted_sunset: raw.sunset - offset,
        }
    }

    /// True when the offset is so large that the adjusted daytime window is
    /// empty or reversed.
    pub fn is_inverted(&self) -> bool {
        self.adjusted_sunrise >= self.adjusted_sunset
    }

    /// Apply the ordering policy: the adjusted sunrise if it is still ahead,
    /// otherwise the adjusted sunset if it is still ahead.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<Transition> {
        if self.adjusted_sunrise > now {
            Some(Transition {
                status: Status::Daytime,
                at: self.adjusted_sunrise,
            })
        } else if self.adjusted_sunset > now {
            Some(Transition {
                status: Status::Nighttime,
                at: self.adjusted_sunset,
            })
        } else {
            None
        }
    }
}

/// Result of one calculation: the transition and the boundaries it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calculation {
    pub transition: Transition,
    pub boundaries: DayBoundaries,
    /// True if today's boundaries had both elapsed and the following date
    /// was used instead.
    pub used_next_day: bool,
}

/// Computes the next day/night transition for a fixed location and offset.
pub struct Calculator {
    model: Box<dyn SolarModel>,
    location: Location,
    offset: Duration,
}

impl Calculator {
    pub fn new(model: Box<dyn SolarModel>, location: Location, offset: Duration) -> Self {
        Self {
            model,
            location,
            offset,
        }
    }

    /// Calculator backed by the astronomical [`SunriseModel`].
    pub fn with_sunrise_model(location: Location, offset: Duration) -> Self {
        Self::new(Box::new(SunriseModel), location, offset)
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn offset(&self) -> Duration {
        self.offset
    }

    /// Offset-adjusted boundaries for a calendar date.
    pub fn boundaries(&self, date: NaiveDate) -> Result<DayBoundaries, CalculationError> {
        let raw = self
            .model
            .sun_times(date, self.location.latitude, self.location.longitude)?;
        Ok(DayBoundaries::from_sun_times(date, raw, self.offset))
    }

    /// Next transition strictly after `now`.
    pub fn compute_next<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<Transition, DaytimeError> {
        self.calculate(now).map(|calculation| calculation.transition)
    }

    /// Next transition strictly after `now`, with the boundaries used.
    ///
    /// When both of today's adjusted boundaries are at or before `now`, the
    /// following date is tried before reporting a scheduling gap.
    pub fn calculate<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<Calculation, DaytimeError> {
        let today = now.date_naive();
        let now_utc = now.with_timezone(&Utc);

        let boundaries = self.boundaries(today)?;
        if let Some(transition) = boundaries.next_after(now_utc) {
            return Ok(Calculation {
                transition,
                boundaries,
                used_next_day: false,
            });
        }

        let tomorrow = today
            .succ_opt()
            .ok_or(CalculationError::DateOutOfRange(today))?;
        let boundaries = self.boundaries(tomorrow)?;
        match boundaries.next_after(now_utc) {
            Some(transition) => Ok(Calculation {
                transition,
                boundaries,
                used_next_day: true,
            }),
            None => Err(DaytimeError::SchedulingGap { date: tomorrow }),
        }
    }
}
