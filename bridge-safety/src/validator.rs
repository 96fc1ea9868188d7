//! The validator context object
//!
//! `SafetyValidator` owns every piece of mutable safety state - the
//! controls-allowed flag, the driver torque tracker, the limiter states,
//! the button edge detector and the relay malfunction latch. Nothing is
//! global: independent instances do not observe each other, which is what
//! makes the validator testable in isolation.
//!
//! Processing is single-context and synchronous: every observation or
//! evaluation call runs to completion before the next, so no interior
//! locking exists. `reinit` is the one reinitialization barrier and must
//! only run while frame processing is quiesced.

use crate::accel::AccelLimiter;
use crate::buttons::{ButtonStateMachine, Engagement};
use crate::clock::{Clock, MonotonicClock};
use crate::config::VehicleProfile;
use crate::gate::ForwardingGate;
use crate::torque::{DriverTorqueTracker, TorqueCommandLimiter};
use crate::types::{AccStatus, Bus, MessageId, ProfileError, TxCommand};

/// Per-message safety validator for one vehicle profile
pub struct SafetyValidator {
    profile: VehicleProfile,
    clock: Box<dyn Clock>,

    /// The single authoritative "automation may command the vehicle" flag
    controls_allowed: bool,

    driver_torque: DriverTorqueTracker,
    torque_limiter: TorqueCommandLimiter,
    accel_limiter: AccelLimiter,
    buttons: ButtonStateMachine,
    gate: ForwardingGate,

    // vehicle status observations, recorded for diagnostics
    brake_pressed: bool,
    gas_pressed: bool,
    vehicle_moving: bool,
}

impl SafetyValidator {
    /// Build a validator from a profile, validating it first
    pub fn new(profile: VehicleProfile) -> Result<Self, ProfileError> {
        Self::with_clock(profile, Box::new(MonotonicClock::new()))
    }

    /// Build with an explicit clock; used by tests to drive the real-time
    /// torque check deterministically
    pub fn with_clock(profile: VehicleProfile, clock: Box<dyn Clock>) -> Result<Self, ProfileError> {
        profile.validate()?;
        log::info!(
            "safety validator initialized: profile {} (longitudinal {})",
            profile.name,
            profile.longitudinal_control_enabled
        );

        Ok(Self {
            driver_torque: DriverTorqueTracker::new(profile.torque.driver_torque_range),
            torque_limiter: TorqueCommandLimiter::new(profile.torque.clone()),
            accel_limiter: AccelLimiter::new(profile.accel.clone()),
            buttons: ButtonStateMachine::new(profile.longitudinal_control_enabled),
            gate: ForwardingGate::new(&profile),
            controls_allowed: false,
            brake_pressed: false,
            gas_pressed: false,
            vehicle_moving: false,
            profile,
            clock,
        })
    }

    // --- inbound observation API (inputs are never blocked) ---

    /// Measured driver steering torque, sign included
    pub fn on_driver_torque(&mut self, torque: i32) {
        self.driver_torque.update(torque);
    }

    /// Brake light / brake pedal state
    pub fn on_brake(&mut self, active: bool) {
        self.brake_pressed = active;
    }

    /// Raw driver throttle input
    pub fn on_driver_gas(&mut self, value: f64) {
        self.gas_pressed = value > 0.0;
    }

    /// ACC status from the drivetrain coordinator
    pub fn on_acc_status(&mut self, status: AccStatus) {
        let decision = self.buttons.on_acc_status(status);
        self.apply_engagement(decision);
    }

    /// Cruise control button frame received from the vehicle
    ///
    /// Drives engagement in full longitudinal mode; ignored for engagement
    /// in the stock integration.
    pub fn on_cruise_buttons(&mut self, cancel: bool, set: bool, resume: bool) {
        let decision = self.buttons.on_buttons(cancel, set, resume);
        self.apply_engagement(decision);
    }

    /// Per-wheel speed observations
    pub fn on_speed(&mut self, wheel_speeds: &[f64]) {
        if wheel_speeds.is_empty() {
            return;
        }
        let mean = wheel_speeds.iter().sum::<f64>() / wheel_speeds.len() as f64;
        self.vehicle_moving = mean > self.profile.standstill_threshold;
    }

    // --- outbound evaluation API ---

    /// Gate one outbound frame: catalog membership, kind consistency, then
    /// the limiter for its kind. Unknown `(id, bus)` pairs are denied.
    pub fn should_transmit(&mut self, bus: Bus, id: MessageId, command: &TxCommand) -> bool {
        let kind = match self.gate.tx_kind(bus, id) {
            Some(kind) => kind,
            None => {
                log::debug!("tx blocked: 0x{:X} on bus {} not in catalog", id, bus);
                return false;
            }
        };
        if kind != command.kind() {
            log::debug!(
                "tx blocked: 0x{:X} on bus {} carries {:?}, catalog says {:?}",
                id,
                bus,
                command.kind(),
                kind
            );
            return false;
        }

        match *command {
            TxCommand::Steering { torque, steer_req } => {
                self.evaluate_steering_command(torque, steer_req)
            }
            TxCommand::AccelRequest { accel, secondary_accel } => {
                self.evaluate_accel_command(accel, secondary_accel)
            }
            TxCommand::CruiseButtons { cancel, set, resume } => {
                self.evaluate_button_frame(cancel, set, resume)
            }
            TxCommand::Hud => true,
        }
    }

    /// Validate an outbound steering torque command
    pub fn evaluate_steering_command(&mut self, torque: i32, steer_req: bool) -> bool {
        let now_us = self.clock.now_us();
        self.torque_limiter.evaluate(
            torque,
            steer_req,
            &self.driver_torque,
            self.controls_allowed,
            now_us,
        )
    }

    /// Validate an outbound acceleration request
    pub fn evaluate_accel_command(&mut self, accel: f64, secondary_accel: f64) -> bool {
        self.accel_limiter
            .evaluate(accel, secondary_accel, self.controls_allowed)
    }

    /// Button-spam policy for outbound button frames
    ///
    /// Lateral-only mode: the driver's cancel always goes through; set and
    /// resume only while engaged, so a disengaged device cannot spam the
    /// stock ACC back on. Full longitudinal mode never transmits this
    /// frame type.
    pub fn evaluate_button_frame(&mut self, _cancel: bool, set: bool, resume: bool) -> bool {
        if self.profile.longitudinal_control_enabled {
            return false;
        }
        if (set || resume) && !self.controls_allowed {
            log::debug!("button frame blocked: set/resume while disengaged");
            return false;
        }
        true
    }

    // --- forwarding API ---

    /// Decide relay of a received frame to the other bus
    pub fn should_forward(&mut self, bus: Bus, id: MessageId) -> Option<Bus> {
        let had_malfunction = self.gate.relay_malfunction();
        let target = self.gate.should_forward(bus, id);
        if self.gate.relay_malfunction() && !had_malfunction {
            log::warn!("controls disengaged: relay malfunction fail-safe");
            self.controls_allowed = false;
        }
        target
    }

    // --- state accessors ---

    pub fn controls_allowed(&self) -> bool {
        self.controls_allowed
    }

    pub fn relay_malfunction(&self) -> bool {
        self.gate.relay_malfunction()
    }

    pub fn torque_driver_min(&self) -> i32 {
        self.driver_torque.min()
    }

    pub fn torque_driver_max(&self) -> i32 {
        self.driver_torque.max()
    }

    pub fn brake_pressed(&self) -> bool {
        self.brake_pressed
    }

    pub fn gas_pressed(&self) -> bool {
        self.gas_pressed
    }

    pub fn vehicle_moving(&self) -> bool {
        self.vehicle_moving
    }

    pub fn profile(&self) -> &VehicleProfile {
        &self.profile
    }

    /// Full reinitialization barrier: restores the post-construction state,
    /// including the relay malfunction latch. Must only run while frame
    /// processing is quiesced.
    pub fn reinit(&mut self) {
        self.controls_allowed = false;
        self.driver_torque.reset();
        self.torque_limiter.reset();
        self.buttons.reset();
        self.gate.reset();
        self.brake_pressed = false;
        self.gas_pressed = false;
        self.vehicle_moving = false;
        log::info!("safety validator reinitialized: profile {}", self.profile.name);
    }

    fn apply_engagement(&mut self, decision: Option<Engagement>) {
        match decision {
            Some(Engagement::Engage) => {
                // the relay fail-safe is permanent until reinit
                if !self.gate.relay_malfunction() {
                    self.controls_allowed = true;
                }
            }
            Some(Engagement::Disengage) => {
                self.controls_allowed = false;
            }
            None => {}
        }
    }
}
