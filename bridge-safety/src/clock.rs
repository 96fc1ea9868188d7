//! Monotonic time source for the real-time delta check
//!
//! The only time-based logic in the validator is the `rt_interval_us`
//! re-anchoring of the steering real-time cross-check. The clock is a
//! trait so tests can drive it deterministically; production code uses
//! `MonotonicClock`. The clock is sampled inside evaluation calls, never
//! scheduled.

use std::time::Instant;

/// Source of monotonic microsecond timestamps
pub trait Clock {
    fn now_us(&self) -> u64;
}

/// Default clock backed by `std::time::Instant`
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let a = clock.now_us();
        let b = clock.now_us();
        assert!(b >= a);
    }
}
