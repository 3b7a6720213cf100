//! One-timer scheduler that publishes day/night transitions.
//!
//! [`Scheduler::start`] computes the first transition on the caller's thread,
//! publishes the current status, the next status and the next time, and hands
//! the state to a worker thread. The worker is a single event loop: it blocks
//! on its command channel with a timeout equal to the time left until the
//! pending deadline. A timeout is a fire, a `Stop` command (or the scheduler
//! being dropped) ends the loop. Fires and stop can therefore never overlap.
//!
//! After every fire the next transition is recalculated from
//! `max(now, fired instant)`, which keeps the schedule strictly increasing
//! even if the clock lags behind the timer. A failed recalculation arms a
//! retry timer with exponential backoff in place of the transition timer.

pub mod state;

use chrono::{DateTime, Local, Utc};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::common::constants::*;
use crate::common::utils::format_duration;
use crate::error::DaytimeError;
use crate::geo::{Calculation, Calculator, Status, Transition};
use crate::time_source::TimeSource;
use crate::transport::{Publisher, RetryPolicy, publish_with_retry};

pub use state::{PendingRetry, Phase, SchedulerState};

/// Delay schedule for recalculation retries: `base`, doubling per attempt,
/// never above `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: RECALC_RETRY_BASE,
            max: RECALC_RETRY_MAX,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (starting at 1).
    pub fn delay(&self, attempt: u32) -> Duration {
        let mut delay = self.base;
        for _ in 1..attempt {
            if delay >= self.max {
                break;
            }
            delay = delay.saturating_mul(2);
        }
        delay.min(self.max)
    }
}

/// Everything the scheduler needs, injected by the hosting process.
pub struct SchedulerParams {
    pub calculator: Calculator,
    pub publisher: Arc<dyn Publisher>,
    pub clock: Arc<dyn TimeSource>,
    pub publish_retry: RetryPolicy,
    pub recalc_backoff: BackoffPolicy,
    pub debug_enabled: bool,
}

impl SchedulerParams {
    pub fn new(
        calculator: Calculator,
        publisher: Arc<dyn Publisher>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            calculator,
            publisher,
            clock,
            publish_retry: RetryPolicy::default(),
            recalc_backoff: BackoffPolicy::default(),
            debug_enabled: false,
        }
    }

    pub fn with_publish_retry(mut self, policy: RetryPolicy) -> Self {
        self.publish_retry = policy;
        self
    }

    pub fn with_recalc_backoff(mut self, policy: BackoffPolicy) -> Self {
        self.recalc_backoff = policy;
        self
    }

    pub fn with_debug(mut self, debug_enabled: bool) -> Self {
        self.debug_enabled = debug_enabled;
        self
    }
}

enum Command {
    Stop,
}

/// The single pending timer.
#[derive(Debug, Clone, Copy)]
enum Timer {
    Transition(Transition),
    Retry {
        at: DateTime<Utc>,
        attempt: u32,
        /// Instant of the transition that fired before the failure.
        floor: DateTime<Utc>,
    },
}

impl Timer {
    fn deadline(&self) -> DateTime<Utc> {
        match self {
            Timer::Transition(transition) => transition.at,
            Timer::Retry { at, .. } => *at,
        }
    }
}

/// Handle to a running scheduler.
pub struct Scheduler {
    commands: Sender<Command>,
    worker: JoinHandle<()>,
    state: Arc<Mutex<SchedulerState>>,
    publisher: Arc<dyn Publisher>,
}

impl Scheduler {
    /// Compute the first transition, publish the initial messages and arm
    /// the timer.
    ///
    /// A calculation failure aborts start before anything is published.
    /// Publish failures are logged and do not.
    pub fn start(params: SchedulerParams) -> Result<Self, DaytimeError> {
        let calculation = params.calculator.calculate(&params.clock.now())?;
        let current = calculation.transition.status.complement();

        let state = Arc::new(Mutex::new(SchedulerState::new(current)));
        let publisher = Arc::clone(&params.publisher);
        let (commands, receiver) = mpsc::channel();

        let mut worker = Worker {
            calculator: params.calculator,
            publisher: params.publisher,
            clock: params.clock,
            publish_retry: params.publish_retry,
            recalc_backoff: params.recalc_backoff,
            debug_enabled: params.debug_enabled,
            current,
            timer: Timer::Transition(calculation.transition),
            fired: 0,
            state: Arc::clone(&state),
        };

        log_block_start!("Current status: {}", current);
        worker.publish(TOPIC_STATUS, current.as_str());
        worker.announce(&calculation);
        worker.sync_state(Phase::Armed);

        let handle = thread::Builder::new()
            .name("daytime-scheduler".to_string())
            .spawn(move || worker.run(receiver))
            .map_err(|e| {
                DaytimeError::Configuration(format!("failed to spawn scheduler thread: {e}"))
            })?;

        Ok(Self {
            commands,
            worker: handle,
            state,
            publisher,
        })
    }

    /// Latest snapshot of the worker's state.
    pub fn state(&self) -> SchedulerState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cancel the pending timer, wait for an in-flight fire to finish and
    /// close the transport. Nothing is published once this returns.
    pub fn stop(self) -> Result<(), DaytimeError> {
        // A send error means the worker is already gone
        let _ = self.commands.send(Command::Stop);
        if self.worker.join().is_err() {
            log_pipe!();
            log_error!("Scheduler worker panicked");
        }
        self.publisher.close()?;
        Ok(())
    }
}

/// State owned by the worker thread.
struct Worker {
    calculator: Calculator,
    publisher: Arc<dyn Publisher>,
    clock: Arc<dyn TimeSource>,
    publish_retry: RetryPolicy,
    recalc_backoff: BackoffPolicy,
    debug_enabled: bool,
    current: Status,
    timer: Timer,
    fired: u64,
    state: Arc<Mutex<SchedulerState>>,
}

impl Worker {
    fn run(mut self, commands: Receiver<Command>) {
        loop {
            let deadline = self.timer.deadline();
            let remaining = (deadline - self.now_utc())
                .to_std()
                .unwrap_or(Duration::ZERO);
            let wait = self.clock.real_duration(remaining).min(SCHEDULER_MAX_WAIT);

            match commands.recv_timeout(wait) {
                Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    // Waits are sliced, so a timeout may land before the deadline
                    if self.now_utc() >= deadline {
                        self.fire();
                    }
                }
            }
        }

        self.sync_state(Phase::Stopped);
        if self.debug_enabled {
            log_debug!("Scheduler worker stopped after {} transition(s)", self.fired);
        }
    }

    fn fire(&mut self) {
        self.sync_state(Phase::Firing);

        let (floor, failed_attempts) = match self.timer {
            Timer::Transition(transition) => {
                self.fired += 1;
                self.current = transition.status;
                log_block_start!("Transition to {}", transition.status);
                self.publish(TOPIC_STATUS, transition.status.as_str());
                (transition.at, 0)
            }
            Timer::Retry { attempt, floor, .. } => {
                log_block_start!("Retrying transition calculation (attempt {attempt})");
                (floor, attempt)
            }
        };

        self.recalculate(floor, failed_attempts);
        self.sync_state(Phase::Armed);
    }

    /// Arm the next transition, or a retry if the calculation fails.
    fn recalculate(&mut self, floor: DateTime<Utc>, failed_attempts: u32) {
        let now = self.clock.now();
        let reference = if now.with_timezone(&Utc) < floor {
            floor.with_timezone(&Local)
        } else {
            now
        };

        match self.calculator.calculate(&reference) {
            Ok(calculation) => {
                if failed_attempts > 0 {
                    log_decorated!(
                        "Calculation recovered after {} failed attempt(s)",
                        failed_attempts
                    );
                }
                self.announce(&calculation);
            }
            Err(e) => {
                let attempt = failed_attempts + 1;
                let delay = self.recalc_backoff.delay(attempt);
                let at = reference.with_timezone(&Utc)
                    + chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::hours(1));

                log_pipe!();
                log_error!("Failed to calculate the next transition: {e}");
                log_indented!("Current status stays {}", self.current);
                log_indented!("Retrying in {}", format_duration(delay));

                self.timer = Timer::Retry { at, attempt, floor };
            }
        }
    }

    /// Publish the next status and time of a fresh calculation and arm it.
    fn announce(&mut self, calculation: &Calculation) {
        let transition = calculation.transition;
        let boundaries = &calculation.boundaries;

        if boundaries.is_inverted() {
            log_warning!(
                "Offset of {} minutes leaves no daytime window on {}",
                self.calculator.offset().num_minutes(),
                boundaries.date
            );
        }

        log_decorated!(
            "Next: {} at {} (in {})",
            transition.status,
            transition.render(),
            format_duration(transition.duration_from(self.now_utc()))
        );
        if self.debug_enabled {
            log_debug!(
                "Boundaries for {}: sunrise {} -> {}, sunset {} -> {}{}",
                boundaries.date,
                boundaries.raw.sunrise.with_timezone(&Local).format("%H:%M:%S"),
                boundaries.adjusted_sunrise.with_timezone(&Local).format("%H:%M:%S"),
                boundaries.raw.sunset.with_timezone(&Local).format("%H:%M:%S"),
                boundaries.adjusted_sunset.with_timezone(&Local).format("%H:%M:%S"),
                if calculation.used_next_day {
                    " (next day)"
                } else {
                    ""
                }
            );
        }

        self.publish(TOPIC_NEXT_STATUS, transition.status.as_str());
        self.publish(TOPIC_NEXT_TIME, &transition.render());
        self.timer = Timer::Transition(transition);
    }

    /// Retained publish; failures are logged and swallowed.
    fn publish(&self, topic: &str, payload: &str) {
        if let Err(e) = publish_with_retry(
            self.publisher.as_ref(),
            topic,
            payload.as_bytes(),
            true,
            self.publish_retry,
        ) {
            log_pipe!();
            log_warning!("Failed to publish '{payload}' to {topic}: {e}");
        }
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    fn sync_state(&self, phase: Phase) {
        let (pending_transition, retry) = match (phase, self.timer) {
            (Phase::Firing | Phase::Stopped, _) => (None, None),
            (_, Timer::Transition(transition)) => (Some(transition), None),
            (_, Timer::Retry { at, attempt, .. }) => (None, Some(PendingRetry { at, attempt })),
        };

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = SchedulerState {
            phase,
            current_status: self.current,
            pending_transition,
            retry,
            fired: self.fired,
        };
    }
}
