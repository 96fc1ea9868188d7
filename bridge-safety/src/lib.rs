//! ADAS Bridge Safety Validator
//!
//! Independent safety gatekeeper for a CAN bridge device sitting between a
//! driving-automation computer and a vehicle's buses. Every message the
//! automation stack wants to transmit is validated against vehicle-derived
//! ground truth before it can reach a transceiver; every received frame is
//! offered to a forwarding policy deciding relay to the other bus. The
//! automation stack is treated as untrusted: the validator keeps the
//! vehicle controllable by the human driver regardless of its behavior.
//!
//! # Architecture
//!
//! The library is pure decision logic:
//! - Tracks driver steering torque, brake/gas state and ACC status from
//!   received frames (inputs are never blocked)
//! - Enforces torque/acceleration bounds, rate limits and the real-time
//!   delta cross-check on outbound commands
//! - Debounces cruise buttons into the controls-allowed engagement state
//! - Applies the per-bus forwarding blacklist and the relay malfunction
//!   fail-safe
//!
//! The library does NOT:
//! - Touch CAN hardware or perform bus arbitration
//! - Pack or unpack frame payload bytes (the signal extractor does)
//! - Persist any state across power cycles
//!
//! # Example Usage
//!
//! ```
//! use bridge_safety::{profiles, AccStatus, SafetyValidator, TxCommand};
//!
//! let mut validator = SafetyValidator::new(profiles::volkswagen_mqb(true)).unwrap();
//!
//! // vehicle reports ACC main switch on; driver presses then releases SET
//! validator.on_acc_status(AccStatus::Standby);
//! validator.on_cruise_buttons(false, true, false);
//! validator.on_cruise_buttons(false, false, false);
//! assert!(validator.controls_allowed());
//!
//! // a small steering torque step is transmittable, a huge one is not
//! let small = TxCommand::Steering { torque: 4, steer_req: true };
//! let huge = TxCommand::Steering { torque: 400, steer_req: true };
//! assert!(validator.should_transmit(0, profiles::MSG_HCA_01, &small));
//! assert!(!validator.should_transmit(0, profiles::MSG_HCA_01, &huge));
//! ```

// Public modules
pub mod clock;
pub mod config;
pub mod profiles;
pub mod types;
pub mod validator;

// Re-export main types for convenience
pub use clock::{Clock, MonotonicClock};
pub use config::{AccelLimits, BusRemap, ForwardBlock, TorqueLimits, TxMessage, VehicleProfile};
pub use types::{AccStatus, Bus, MessageId, ProfileError, TxCommand, TxKind};
pub use validator::SafetyValidator;

// Internal modules (not exposed in public API)
mod accel;
mod buttons;
mod gate;
mod torque;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
