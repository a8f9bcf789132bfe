//! Monotonic clock adapter.
//!
//! Implements [`ClockPort`] on top of `std::time::Instant`, which is
//! monotonic on every supported host and resolves well below the PWM
//! period.

use std::time::Instant;

use crate::app::ports::ClockPort;

/// Nanoseconds since the adapter was created.
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Microseconds since creation.
    pub fn uptime_us(&self) -> u64 {
        self.now_ns() / 1_000
    }
}

impl ClockPort for MonotonicClock {
    fn now_ns(&self) -> u64 {
        // u64 nanoseconds cover ~584 years of uptime.
        self.start.elapsed().as_nanos() as u64
    }
}
