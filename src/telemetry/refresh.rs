use std::fmt;
use std::time::Duration;

use jiff::Timestamp;
use tracing::{Level, event};
use uuid::Uuid;

use crate::errors::Error;

/// What caused an access-token fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// No usable token was cached and a caller is waiting.
    ColdStart,
    /// The background refresh chain woke up ahead of expiry.
    Scheduled,
}

impl fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshTrigger::ColdStart => write!(f, "cold_start"),
            RefreshTrigger::Scheduled => write!(f, "scheduled"),
        }
    }
}

/// Structured events for a single token fetch attempt.
#[derive(Clone, Debug)]
pub struct RefreshTelemetry {
    attempt_id: Uuid,
    trigger: RefreshTrigger,
}

impl RefreshTelemetry {
    pub fn new(trigger: RefreshTrigger) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            trigger,
        }
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn trigger(&self) -> RefreshTrigger {
        self.trigger
    }

    pub fn emit_start(&self) {
        event!(
            Level::DEBUG,
            attempt_id = %self.attempt_id,
            trigger = %self.trigger,
            "refresh.start"
        );
    }

    pub fn emit_success(&self, expires_at: Timestamp, next_refresh_in: Duration) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            trigger = %self.trigger,
            expires_at = %expires_at,
            next_refresh_in = ?next_refresh_in,
            "refresh.success"
        );
    }

    pub fn emit_failure(&self, error: &Error) {
        event!(
            Level::WARN,
            attempt_id = %self.attempt_id,
            trigger = %self.trigger,
            error = %error,
            "refresh.failure"
        );
    }
}
