//! Core types for the bridge safety validator
//!
//! This module defines the vocabulary shared by the limiters, the button
//! state machine and the forwarding gate. The validator deals in typed
//! signals only - byte-level frame packing/unpacking lives in the signal
//! extractor, outside this crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// CAN bus (channel) number, e.g. 0 = powertrain side, 2 = camera side
pub type Bus = u8;

/// CAN message ID (11-bit or 29-bit)
pub type MessageId = u32;

/// Engagement status reported by the vehicle's own ACC system
///
/// Decoded from the drivetrain coordinator status signal by the signal
/// extractor. Raw values outside the known range must be mapped to `Off`
/// (the most restrictive reading) before they reach the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccStatus {
    /// ACC main switch is off; set/resume presses are meaningless
    Off,
    /// Main switch on, cruise not engaged
    Standby,
    /// Stock ACC actively engaged
    Active,
}

impl AccStatus {
    /// True when the ACC main switch is on (`Standby` or `Active`)
    pub fn main_switch_on(self) -> bool {
        !matches!(self, AccStatus::Off)
    }

    /// Conservative mapping from a raw status value: anything unknown is `Off`
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            2 => AccStatus::Standby,
            3..=5 => AccStatus::Active,
            _ => AccStatus::Off,
        }
    }
}

impl fmt::Display for AccStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccStatus::Off => write!(f, "off"),
            AccStatus::Standby => write!(f, "standby"),
            AccStatus::Active => write!(f, "active"),
        }
    }
}

/// The kind of outbound message a catalog entry maps to
///
/// Each transmittable message ID resolves to exactly one kind at
/// configuration time. Evaluation dispatches on this closed set rather
/// than inspecting payload bytes per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    /// Steering torque command, checked by the torque limiter
    Steering,
    /// Longitudinal acceleration request, checked by the accel limiter
    AccelRequest,
    /// Cruise control button frame, checked by the button-spam policy
    CruiseButtons,
    /// Informational HUD/display frame, allowed unconditionally
    Hud,
}

/// A typed outbound command offered for transmission
///
/// The payload the automation stack wants to send, already decoded into
/// signals. `should_transmit` checks that the command's kind matches the
/// catalog entry for its message ID before any limiter runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TxCommand {
    /// Steering torque command with its request bit
    Steering { torque: i32, steer_req: bool },
    /// Acceleration request; `secondary_accel` is the redundant field
    /// consumed by a different downstream subsystem (ABS/ESP cross-check)
    AccelRequest { accel: f64, secondary_accel: f64 },
    /// Cruise control button presses
    CruiseButtons { cancel: bool, set: bool, resume: bool },
    /// HUD/lane-warning/text frame; carries no actuation
    Hud,
}

impl TxCommand {
    /// The catalog kind this command must match
    pub fn kind(&self) -> TxKind {
        match self {
            TxCommand::Steering { .. } => TxKind::Steering,
            TxCommand::AccelRequest { .. } => TxKind::AccelRequest,
            TxCommand::CruiseButtons { .. } => TxKind::CruiseButtons,
            TxCommand::Hud => TxKind::Hud,
        }
    }
}

/// Errors raised when a vehicle profile fails validation at init
///
/// These surface once, from `SafetyValidator::new`. After successful
/// construction no public operation returns an error: policy denials are
/// plain boolean outcomes, not faults.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("torque limit misconfigured: {0}")]
    InvalidTorqueLimits(String),

    #[error("accel limit misconfigured: min {min} must be below max {max}")]
    InvalidAccelLimits { min: f64, max: f64 },

    #[error("transmit allowlist is empty; every outbound frame would be denied")]
    EmptyTxAllowlist,

    #[error("forward blacklist references bus {0} missing from the bus map")]
    BlacklistBusNotMapped(Bus),

    #[error("relay malfunction bus {0} missing from the bus map")]
    RelayBusNotMapped(Bus),
}
