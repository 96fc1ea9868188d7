//! Driver torque tracking and steering command limiting
//!
//! Two pieces live here. `DriverTorqueTracker` follows the measured driver
//! steering torque as a rolling min/max pair that decays toward zero when
//! the driver stops providing input. `TorqueCommandLimiter` checks every
//! outbound steering command against the absolute cap, the per-sample rate
//! envelope (relaxed in the driver's favor during an override) and the
//! real-time delta cross-check.

use crate::config::TorqueLimits;

/// Samples an extremum stays current without being reinforced. Matches the
/// observation cadence of the driver torque message: after this many
/// non-extreme samples the tracked value collapses onto the newest one.
const EXTREMUM_WINDOW: u32 = 6;

/// Rolling min/max of measured driver steering torque
///
/// Holds only the two extrema and their ages, not a sample buffer. The
/// invariant `min <= 0 <= max` holds after every update.
#[derive(Debug, Clone)]
pub struct DriverTorqueTracker {
    min: i32,
    max: i32,
    min_age: u32,
    max_age: u32,
    /// Physical span of the torque signal; observations outside it are
    /// clamped rather than rejected (availability over strictness)
    range: i32,
}

impl DriverTorqueTracker {
    pub fn new(range: i32) -> Self {
        Self { min: 0, max: 0, min_age: 0, max_age: 0, range }
    }

    /// Record one driver torque observation
    pub fn update(&mut self, torque: i32) {
        let obs = torque.clamp(-self.range, self.range);

        if obs >= self.max {
            self.max = obs.max(0);
            self.max_age = 0;
        } else {
            self.max_age += 1;
            if self.max_age >= EXTREMUM_WINDOW {
                self.max = obs.max(0);
                self.max_age = 0;
            }
        }

        if obs <= self.min {
            self.min = obs.min(0);
            self.min_age = 0;
        } else {
            self.min_age += 1;
            if self.min_age >= EXTREMUM_WINDOW {
                self.min = obs.min(0);
                self.min_age = 0;
            }
        }
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn reset(&mut self) {
        self.min = 0;
        self.max = 0;
        self.min_age = 0;
        self.max_age = 0;
    }
}

/// Per-command steering torque validation
///
/// Owns the last *allowed* command (the reference for the next rate check)
/// and the real-time anchor. A rejected command leaves all of this state
/// untouched; rejection is a routine outcome, not a fault.
#[derive(Debug, Clone)]
pub struct TorqueCommandLimiter {
    limits: TorqueLimits,
    last_torque: i32,
    rt_torque: i32,
    rt_anchor_ts_us: u64,
}

impl TorqueCommandLimiter {
    pub fn new(limits: TorqueLimits) -> Self {
        Self {
            limits,
            last_torque: 0,
            rt_torque: 0,
            rt_anchor_ts_us: 0,
        }
    }

    /// Validate one outbound steering command
    ///
    /// Returns true when the frame may be transmitted. Only an allowed
    /// command updates the rate reference and, once `rt_interval_us` has
    /// elapsed, the real-time anchor.
    pub fn evaluate(
        &mut self,
        torque: i32,
        steer_req: bool,
        driver: &DriverTorqueTracker,
        controls_allowed: bool,
        now_us: u64,
    ) -> bool {
        let mut violation = false;

        // commanding torque without asserting the request bit is malformed
        if torque != 0 && !steer_req {
            violation = true;
        }

        if controls_allowed {
            violation |= torque.abs() > self.limits.max_torque;
            violation |= !self.within_driver_envelope(torque, driver);
            violation |= !self.within_rt_delta(torque);
        } else if torque != 0 {
            // disengaged: only the neutral command passes
            violation = true;
        }

        if violation {
            log::debug!(
                "steering command blocked: torque {} (last allowed {}, controls_allowed {})",
                torque,
                self.last_torque,
                controls_allowed
            );
            return false;
        }

        self.last_torque = torque;
        if now_us.saturating_sub(self.rt_anchor_ts_us) > self.limits.rt_interval_us {
            self.rt_torque = torque;
            self.rt_anchor_ts_us = now_us;
        }
        true
    }

    /// Rate envelope around the last allowed value, widened toward the
    /// driver's side of a torque fight. Magnitude may grow by at most
    /// `max_rate_up` per sample and must come down at least as fast as
    /// `max_rate_down` once past the driver-aware cap; the cap itself is
    /// `max_torque` less the driver's opposing torque beyond the
    /// allowance, scaled by `driver_torque_factor`.
    fn within_driver_envelope(&self, torque: i32, driver: &DriverTorqueTracker) -> bool {
        let l = &self.limits;

        let highest_rate = self.last_torque.max(0) + l.max_rate_up;
        let lowest_rate = self.last_torque.min(0) - l.max_rate_up;

        // opposition to a positive command is a negative driver torque, so
        // the positive cap shrinks with driver.min (and vice versa); past
        // the allowance each opposing count removes driver_torque_factor
        // counts of commandable torque
        let driver_cap_high = l.max_torque + (l.driver_torque_allowance + driver.min()) * l.driver_torque_factor;
        let driver_cap_low = -l.max_torque + (-l.driver_torque_allowance + driver.max()) * l.driver_torque_factor;

        let highest = highest_rate.min((self.last_torque - l.max_rate_down).max(driver_cap_high.max(0)));
        let lowest = lowest_rate.max((self.last_torque + l.max_rate_down).min(driver_cap_low.min(0)));

        (lowest..=highest).contains(&torque)
    }

    /// Coarse bound against the periodically re-anchored reference;
    /// prevents many individually legal steps from drifting far within
    /// one anchor interval
    fn within_rt_delta(&self, torque: i32) -> bool {
        let highest = self.rt_torque.max(0) + self.limits.max_rt_delta;
        let lowest = self.rt_torque.min(0) - self.limits.max_rt_delta;
        (lowest..=highest).contains(&torque)
    }

    pub fn reset(&mut self) {
        self.last_torque = 0;
        self.rt_torque = 0;
        self.rt_anchor_ts_us = 0;
    }
}
