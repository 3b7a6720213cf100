//! Publish-subscribe transport.
//!
//! The scheduler only needs two operations from the messaging layer, captured
//! by the [`Publisher`] trait. [`mqtt::MqttPublisher`] talks to a broker;
//! [`LogPublisher`] is the dry-run stand-in used by `--dry-run` and the
//! `simulate` command.

pub mod mqtt;

use std::thread;
use std::time::Duration;

use crate::error::PublishError;

pub use mqtt::MqttPublisher;

/// Outbound messaging interface.
#[cfg_attr(test, mockall::automock)]
pub trait Publisher: Send + Sync {
    /// Publish `payload` on `topic`. With `retained` set, the broker keeps the
    /// message for subscribers that connect later.
    fn publish(&self, topic: &str, payload: &[u8], retained: bool) -> Result<(), PublishError>;

    /// Release the connection. No publish may follow.
    fn close(&self) -> Result<(), PublishError>;
}

/// Retry policy for individual publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero behaves like one.
    pub attempts: u32,
    /// Delay after the first failure, doubled after each further failure.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: crate::common::constants::PUBLISH_ATTEMPTS,
            base_delay: crate::common::constants::PUBLISH_RETRY_BASE,
        }
    }
}

/// Publish with doubling backoff between attempts.
///
/// Retained messages are idempotent to redeliver, so a retry can never leave
/// subscribers with a different value than a single successful attempt.
/// Returns the last error once all attempts are used.
pub fn publish_with_retry(
    publisher: &dyn Publisher,
    topic: &str,
    payload: &[u8],
    retained: bool,
    policy: RetryPolicy,
) -> Result<(), PublishError> {
    let attempts = policy.attempts.max(1);
    let mut delay = policy.base_delay;
    let mut attempt = 1;
    loop {
        match publisher.publish(topic, payload, retained) {
            Ok(()) => return Ok(()),
            Err(e) if attempt >= attempts => return Err(e),
            Err(_) => {
                thread::sleep(delay);
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
        }
    }
}

/// Transport that logs messages instead of sending them.
#[derive(Debug, Default)]
pub struct LogPublisher;

impl Publisher for LogPublisher {
    fn publish(&self, topic: &str, payload: &[u8], retained: bool) -> Result<(), PublishError> {
        let retained = if retained { " (retained)" } else { "" };
        log_indented!(
            "{topic} <- {}{retained}",
            String::from_utf8_lossy(payload)
        );
        Ok(())
    }

    fn close(&self) -> Result<(), PublishError> {
        Ok(())
    }
}
