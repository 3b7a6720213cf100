//! Deterministic collaborators for tests.
//!
//! Compiled for unit tests and for integration tests through the
//! `testing-support` feature.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{CalculationError, PublishError};
use crate::geo::solar::{SolarModel, SunTimes};
use crate::transport::Publisher;

/// Solar model with the same wall-clock sunrise and sunset every day.
///
/// Clones share the failure counter, so a test can keep a handle after
/// handing the model to a calculator.
#[derive(Debug, Clone)]
pub struct FixedSolarModel {
    zone: FixedOffset,
    sunrise: NaiveTime,
    sunset: NaiveTime,
    failures: Arc<AtomicU32>,
}

impl FixedSolarModel {
    pub fn new(zone: FixedOffset, sunrise: NaiveTime, sunset: NaiveTime) -> Self {
        Self {
            zone,
            sunrise,
            sunset,
            failures: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Sunrise and sunset given as `(hour, minute)` in UTC.
    pub fn utc(sunrise: (u32, u32), sunset: (u32, u32)) -> Self {
        let time = |(h, m): (u32, u32)| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        Self::new(
            FixedOffset::east_opt(0).unwrap(),
            time(sunrise),
            time(sunset),
        )
    }

    /// Make the next `count` calls fail as if the sun never rose.
    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    fn at(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        self.zone
            .from_local_datetime(&date.and_time(time))
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }
}

impl SolarModel for FixedSolarModel {
    fn sun_times(
        &self,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> Result<SunTimes, CalculationError> {
        let pending = self.failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.failures.store(pending - 1, Ordering::SeqCst);
            return Err(CalculationError::NoEvent {
                event: "sunrise",
                date,
                latitude,
                longitude,
            });
        }
        Ok(SunTimes {
            sunrise: self.at(date, self.sunrise),
            sunset: self.at(date, self.sunset),
        })
    }
}

/// One call observed by a [`RecordingPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Publish {
        topic: String,
        payload: String,
        retained: bool,
    },
    Close,
}

/// Publisher that records every call in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    records: Arc<Mutex<Vec<Record>>>,
    failing: Arc<AtomicBool>,
    delay: Arc<Mutex<Duration>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every publish while set (calls are still recorded).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Block for `delay` inside every publish.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    /// `(topic, payload)` of every publish, in order.
    pub fn published(&self) -> Vec<(String, String)> {
        self.records()
            .into_iter()
            .filter_map(|record| match record {
                Record::Publish { topic, payload, .. } => Some((topic, payload)),
                Record::Close => None,
            })
            .collect()
    }

    /// Payloads published to one topic, in order.
    pub fn payloads(&self, topic: &str) -> Vec<String> {
        self.published()
            .into_iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| payload)
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.records()
            .iter()
            .filter(|record| **record == Record::Close)
            .count()
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, topic: &str, payload: &[u8], retained: bool) -> Result<(), PublishError> {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.records.lock().unwrap().push(Record::Publish {
            topic: topic.to_string(),
            payload: String::from_utf8_lossy(payload).into_owned(),
            retained,
        });
        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::Rejected {
                topic: topic.to_string(),
                reason: "rejected by test publisher".to_string(),
            });
        }
        Ok(())
    }

    fn close(&self) -> Result<(), PublishError> {
        self.records.lock().unwrap().push(Record::Close);
        Ok(())
    }
}
