//! Time source for ACCESO.
//!
//! The institution operates in a fixed offset zone (UTC-4, no daylight
//! saving). Every timestamp that enters the audit trail or the lockout
//! computation flows through a [`Clock`] so that tests can drive the
//! 20-second window without sleeping.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::config::AuthConfig;

/// Default UTC offset in hours for the institution's zone.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = -4;

/// Supplies the current instant in the institution's fixed offset zone.
pub trait Clock: Send + Sync {
    /// Current instant in the configured fixed offset zone.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall-clock time source.
#[derive(Debug, Clone)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Create a clock for the default zone (UTC-4).
    pub fn new() -> Self {
        Self::with_offset_hours(DEFAULT_UTC_OFFSET_HOURS)
    }

    /// Create a clock for an arbitrary whole-hour offset.
    pub fn with_offset_hours(hours: i32) -> Self {
        let offset = FixedOffset::east_opt(hours * 3600).expect("valid UTC offset");
        Self { offset }
    }

    /// Create a clock for the zone configured in [`AuthConfig`].
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::with_offset_hours(config.utc_offset_hours)
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Manually driven clock for tests.
///
/// Clones share the same underlying instant, so a test can keep a handle
/// and advance time while the service under test holds another clone.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<FixedOffset>>>,
}

impl ManualClock {
    /// Create a manual clock starting at the given instant.
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Create a manual clock starting at the current wall-clock time.
    pub fn starting_now() -> Self {
        Self::new(SystemClock::new().now())
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += duration;
    }

    /// Set the clock to an absolute instant.
    pub fn set(&self, instant: DateTime<FixedOffset>) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().expect("clock lock poisoned")
    }
}
