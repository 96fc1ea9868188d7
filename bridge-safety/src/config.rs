//! Vehicle profile configuration
//!
//! A `VehicleProfile` carries everything that varies per car model: numeric
//! command limits, the outbound message catalog, the forwarding policy and
//! the relay malfunction address. It is supplied once at init by the
//! external profile loader and is read-only afterwards - per-model
//! differences live in this data, never in code branches.

use crate::types::{Bus, MessageId, ProfileError, TxKind};
use serde::{Deserialize, Serialize};

/// Steering torque command limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorqueLimits {
    /// Absolute cap on commanded torque magnitude
    pub max_torque: i32,
    /// Max per-sample increase in magnitude relative to the last allowed value
    pub max_rate_up: i32,
    /// Max per-sample decrease toward zero relative to the last allowed value
    pub max_rate_down: i32,
    /// Max drift from the real-time anchor within one anchor interval
    pub max_rt_delta: i32,
    /// Real-time anchor refresh interval, microseconds
    pub rt_interval_us: u64,
    /// Driver torque that must be exceeded before override relaxation applies
    pub driver_torque_allowance: i32,
    /// Scale factor applied to driver torque beyond the allowance
    pub driver_torque_factor: i32,
    /// Physical span of the measured driver torque signal; observations are
    /// clamped to this range before tracking (malformed input rule)
    pub driver_torque_range: i32,
}

/// Longitudinal acceleration command limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccelLimits {
    /// Most negative allowed acceleration request (m/s^2)
    pub min_accel: f64,
    /// Most positive allowed acceleration request (m/s^2)
    pub max_accel: f64,
    /// Wire value of the secondary accel field meaning "no request"
    pub secondary_accel_inactive: f64,
    /// Extension point: when set, the secondary field is validated against
    /// the same static bounds instead of being denied outright. No shipped
    /// profile sets this; the field fails closed today.
    #[serde(default)]
    pub secondary_accel_enabled: bool,
}

/// One entry of the outbound message catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxMessage {
    pub id: MessageId,
    pub bus: Bus,
    pub kind: TxKind,
}

impl TxMessage {
    pub fn new(id: MessageId, bus: Bus, kind: TxKind) -> Self {
        Self { id, bus, kind }
    }
}

/// One bus remap entry: frames received on `source` relay to `target`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusRemap {
    pub source: Bus,
    pub target: Bus,
}

/// One forwarding blacklist entry: `id` is never relayed off `bus`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardBlock {
    pub bus: Bus,
    pub id: MessageId,
}

/// Complete per-model configuration for one validator instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleProfile {
    /// Human-readable profile name, for logs and reports
    pub name: String,

    /// True when the device commands acceleration itself (full longitudinal
    /// control); false when only steering is commanded and the stock ACC
    /// stays in charge of speed
    pub longitudinal_control_enabled: bool,

    pub torque: TorqueLimits,
    pub accel: AccelLimits,

    /// Outbound catalog: every transmittable `(id, bus)` and its kind.
    /// Anything absent is denied.
    pub tx_allowlist: Vec<TxMessage>,

    /// Message IDs never relayed from their source bus
    #[serde(default)]
    pub forward_blacklist: Vec<ForwardBlock>,

    /// Bus remap table; buses without an entry are not relayed
    pub bus_map: Vec<BusRemap>,

    /// Address the device owns exclusively on `relay_malfunction_bus`;
    /// observing it arriving there trips the relay malfunction fail-safe
    pub relay_malfunction_id: MessageId,
    pub relay_malfunction_bus: Bus,

    /// Wheel speed below which the vehicle counts as stationary
    #[serde(default)]
    pub standstill_threshold: f64,
}

impl VehicleProfile {
    /// Builder method: add an outbound catalog entry
    pub fn allow_tx(mut self, id: MessageId, bus: Bus, kind: TxKind) -> Self {
        self.tx_allowlist.push(TxMessage::new(id, bus, kind));
        self
    }

    /// Builder method: blacklist an ID from forwarding off `bus`
    pub fn blacklist_forward(mut self, bus: Bus, id: MessageId) -> Self {
        self.forward_blacklist.push(ForwardBlock { bus, id });
        self
    }

    /// Builder method: relay frames arriving on `source` to `target`
    pub fn map_bus(mut self, source: Bus, target: Bus) -> Self {
        self.bus_map.push(BusRemap { source, target });
        self
    }

    fn bus_is_mapped(&self, bus: Bus) -> bool {
        self.bus_map.iter().any(|remap| remap.source == bus)
    }

    /// Check internal consistency; run once by `SafetyValidator::new`
    pub fn validate(&self) -> Result<(), ProfileError> {
        let t = &self.torque;
        if t.max_torque <= 0 {
            return Err(ProfileError::InvalidTorqueLimits(format!(
                "max_torque {} must be positive",
                t.max_torque
            )));
        }
        if t.max_rate_up <= 0 || t.max_rate_up > t.max_torque {
            return Err(ProfileError::InvalidTorqueLimits(format!(
                "max_rate_up {} outside 1..={}",
                t.max_rate_up, t.max_torque
            )));
        }
        if t.max_rate_down <= 0 || t.max_rate_down > t.max_torque {
            return Err(ProfileError::InvalidTorqueLimits(format!(
                "max_rate_down {} outside 1..={}",
                t.max_rate_down, t.max_torque
            )));
        }
        if t.max_rt_delta <= 0 || t.rt_interval_us == 0 {
            return Err(ProfileError::InvalidTorqueLimits(format!(
                "real-time check misconfigured: delta {} interval {}us",
                t.max_rt_delta, t.rt_interval_us
            )));
        }
        if t.driver_torque_range <= 0 {
            return Err(ProfileError::InvalidTorqueLimits(format!(
                "driver_torque_range {} must be positive",
                t.driver_torque_range
            )));
        }

        if !(self.accel.min_accel < self.accel.max_accel) {
            return Err(ProfileError::InvalidAccelLimits {
                min: self.accel.min_accel,
                max: self.accel.max_accel,
            });
        }

        if self.tx_allowlist.is_empty() {
            return Err(ProfileError::EmptyTxAllowlist);
        }

        for block in &self.forward_blacklist {
            if !self.bus_is_mapped(block.bus) {
                return Err(ProfileError::BlacklistBusNotMapped(block.bus));
            }
        }

        if !self.bus_is_mapped(self.relay_malfunction_bus) {
            return Err(ProfileError::RelayBusNotMapped(self.relay_malfunction_bus));
        }

        Ok(())
    }
}
