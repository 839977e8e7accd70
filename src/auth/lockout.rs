//! Failed-attempt counting and the lazy lockout window.
//!
//! Lock state only changes when someone acts on the account: there is no
//! background job. A blocked account stays blocked until the next login
//! attempt arrives after the window has passed, at which point the caller
//! unblocks it and re-verifies the submitted credentials.

use chrono::{DateTime, Duration, FixedOffset};

/// Failed attempts that trigger an automatic block.
pub const MAX_FAILED_ATTEMPTS: i64 = 5;

/// Seconds a blocked account stays locked.
pub const LOCKOUT_WINDOW_SECS: u64 = 20;

/// Where a blocked account stands relative to its lockout window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutStatus {
    /// The window has fully elapsed; the account may be unblocked.
    Expired,
    /// Still inside the window; `remaining_secs` is rounded up and never
    /// reported as zero.
    Locked { remaining_secs: u64 },
}

/// Evaluate the lockout window against the blocking attempt's timestamp.
///
/// The window expires strictly after `last_attempt + window`: an attempt
/// at exactly T+window is still locked.
pub fn check_expiry(
    last_attempt: DateTime<FixedOffset>,
    now: DateTime<FixedOffset>,
    window_secs: u64,
) -> LockoutStatus {
    let unlock_at = last_attempt + Duration::seconds(window_secs as i64);
    if now > unlock_at {
        return LockoutStatus::Expired;
    }

    let millis = (unlock_at - now).num_milliseconds().max(0) as u64;
    let remaining_secs = ((millis + 999) / 1000).max(1);
    LockoutStatus::Locked { remaining_secs }
}

/// Result of counting one more failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Counter moved but stayed under the threshold.
    Retry { attempts: i64 },
    /// This failure reached the threshold; the account must be blocked.
    Blocked { attempts: i64 },
}

impl FailureOutcome {
    /// The counter value after this failure.
    pub fn attempts(&self) -> i64 {
        match *self {
            FailureOutcome::Retry { attempts } => attempts,
            FailureOutcome::Blocked { attempts } => attempts,
        }
    }
}

/// Count a failed attempt against the current counter.
///
/// The counter never exceeds `max`, even if stale state feeds in a value
/// at or above it.
pub fn register_failure(current: i64, max: i64) -> FailureOutcome {
    let attempts = (current + 1).min(max);
    if attempts >= max {
        FailureOutcome::Blocked { attempts }
    } else {
        FailureOutcome::Retry { attempts }
    }
}
