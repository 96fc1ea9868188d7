//! Longitudinal acceleration command limiting
//!
//! Static bounds only: rate smoothing is the planning layer's concern.
//! The secondary acceleration field (a redundant request consumed by the
//! ABS/ESP side) fails closed until a profile explicitly enables it.

use crate::config::AccelLimits;

/// Validates acceleration requests against the profile's static bounds
#[derive(Debug, Clone)]
pub struct AccelLimiter {
    limits: AccelLimits,
}

impl AccelLimiter {
    pub fn new(limits: AccelLimits) -> Self {
        Self { limits }
    }

    /// Validate one acceleration request frame
    ///
    /// Both fields must pass for the frame to be transmittable. NaN fails
    /// every comparison and is therefore denied.
    pub fn evaluate(&self, accel: f64, secondary_accel: f64, controls_allowed: bool) -> bool {
        let primary_ok = self.primary_ok(accel, controls_allowed);
        let secondary_ok = self.secondary_ok(secondary_accel, controls_allowed);

        if !(primary_ok && secondary_ok) {
            log::debug!(
                "accel command blocked: accel {} secondary {} (controls_allowed {})",
                accel,
                secondary_accel,
                controls_allowed
            );
        }
        primary_ok && secondary_ok
    }

    fn primary_ok(&self, accel: f64, controls_allowed: bool) -> bool {
        if controls_allowed {
            accel >= self.limits.min_accel && accel <= self.limits.max_accel
        } else {
            accel == 0.0
        }
    }

    /// The secondary field must read as "no request" until the profile
    /// capability is set; once set, it obeys the same static bounds
    fn secondary_ok(&self, secondary_accel: f64, controls_allowed: bool) -> bool {
        if self.limits.secondary_accel_enabled {
            self.primary_ok(secondary_accel, controls_allowed)
        } else {
            secondary_accel == self.limits.secondary_accel_inactive
        }
    }
}
