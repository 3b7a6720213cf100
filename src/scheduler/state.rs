//! Observable snapshot of the scheduler.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::geo::{Status, Transition};

/// Lifecycle phase: `Starting -> Armed -> (Firing -> Armed)* -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Starting,
    Armed,
    Firing,
    Stopped,
}

/// A recalculation scheduled after a failed fire-time calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingRetry {
    pub at: DateTime<Utc>,
    /// 1 for the first retry after a failure.
    pub attempt: u32,
}

/// Copy of the worker's state, refreshed after every event.
///
/// At most one of `pending_transition` and `retry` is set at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerState {
    pub phase: Phase,
    pub current_status: Status,
    pub pending_transition: Option<Transition>,
    pub retry: Option<PendingRetry>,
    /// Transitions fired since start.
    pub fired: u64,
}

impl SchedulerState {
    pub(crate) fn new(current_status: Status) -> Self {
        Self {
            phase: Phase::Starting,
            current_status,
            pending_transition: None,
            retry: None,
            fired: 0,
        }
    }

    /// True iff a timer is pending.
    pub fn armed(&self) -> bool {
        self.pending_transition.is_some() || self.retry.is_some()
    }
}
