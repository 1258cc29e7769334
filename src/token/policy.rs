use std::time::Duration;

use jiff::Timestamp;

use crate::errors::Error;

use super::Token;

/// How long before expiry a proactive refresh is scheduled.
pub const DEFAULT_LEAD_TIME: Duration = Duration::from_secs(300);

/// Business rules governing proactive refresh behaviour.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Refresh this long before the token expires when its lifetime allows it.
    pub lead_time: Duration,
}

impl RefreshPolicy {
    pub fn new(lead_time: Duration) -> Result<Self, Error> {
        if lead_time.is_zero() {
            return Err(Error::Config("Refresh lead time must be > 0".into()));
        }
        Ok(Self { lead_time })
    }

    /// Delay until the next refresh of a freshly stored `token`.
    ///
    /// Tokens living longer than the lead time are refreshed `lead_time` before expiry,
    /// shorter ones at expiry. `None` means the token is already expired and must not be
    /// scheduled at all.
    pub fn next_refresh_in(&self, token: &Token, now: Timestamp) -> Option<Duration> {
        let remaining = token.remaining(now);
        if !remaining.is_positive() {
            return None;
        }
        let remaining = Duration::try_from(remaining).ok()?;
        if remaining > self.lead_time {
            Some(remaining - self.lead_time)
        } else {
            Some(remaining)
        }
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            lead_time: DEFAULT_LEAD_TIME,
        }
    }
}
