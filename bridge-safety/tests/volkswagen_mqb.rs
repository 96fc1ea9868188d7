//! Integration tests against the Volkswagen MQB profile
//!
//! Exercises the full validator through its public API the way the bridge
//! firmware would drive it: typed observations in, transmit/forward
//! decisions out.

use bridge_safety::clock::Clock;
use bridge_safety::profiles::{
    self, MSG_ACC_02, MSG_ACC_06, MSG_ACC_07, MSG_GRA_ACC_01, MSG_HCA_01, MSG_LDW_02,
};
use bridge_safety::{AccStatus, SafetyValidator, TxCommand};
use std::cell::Cell;
use std::rc::Rc;

const SECONDARY_INACTIVE: f64 = 3.02;

/// Manually advanced clock shared with the validator under test
#[derive(Clone)]
struct TestClock(Rc<Cell<u64>>);

impl TestClock {
    fn new() -> Self {
        TestClock(Rc::new(Cell::new(0)))
    }

    fn advance_us(&self, us: u64) {
        self.0.set(self.0.get() + us);
    }
}

impl Clock for TestClock {
    fn now_us(&self) -> u64 {
        self.0.get()
    }
}

fn stock_validator() -> SafetyValidator {
    SafetyValidator::new(profiles::volkswagen_mqb(false)).unwrap()
}

fn long_validator() -> (SafetyValidator, TestClock) {
    let clock = TestClock::new();
    let validator =
        SafetyValidator::with_clock(profiles::volkswagen_mqb(true), Box::new(clock.clone()))
            .unwrap();
    (validator, clock)
}

/// Engage via the documented button path: main switch on, SET press, release
fn engage(v: &mut SafetyValidator) {
    v.on_acc_status(AccStatus::Standby);
    v.on_cruise_buttons(false, true, false);
    v.on_cruise_buttons(false, false, false);
    assert!(v.controls_allowed());
}

/// Disengage via a cancel press, then release the button
fn disengage(v: &mut SafetyValidator) {
    v.on_cruise_buttons(true, false, false);
    v.on_cruise_buttons(false, false, false);
    assert!(!v.controls_allowed());
}

fn steering(torque: i32) -> TxCommand {
    TxCommand::Steering { torque, steer_req: torque != 0 }
}

fn accel_request(accel: f64) -> TxCommand {
    TxCommand::AccelRequest { accel, secondary_accel: SECONDARY_INACTIVE }
}

fn buttons(cancel: bool, set: bool, resume: bool) -> TxCommand {
    TxCommand::CruiseButtons { cancel, set, resume }
}

#[test]
fn torque_measurements_track_and_decay() {
    let mut v = stock_validator();
    v.on_driver_torque(50);
    v.on_driver_torque(-50);
    for _ in 0..4 {
        v.on_driver_torque(0);
    }
    assert_eq!(v.torque_driver_min(), -50);
    assert_eq!(v.torque_driver_max(), 50);

    v.on_driver_torque(0);
    assert_eq!(v.torque_driver_max(), 0);
    assert_eq!(v.torque_driver_min(), -50);

    v.on_driver_torque(0);
    assert_eq!(v.torque_driver_max(), 0);
    assert_eq!(v.torque_driver_min(), 0);
}

#[test]
fn stock_mode_spam_cancel_policy() {
    let mut v = stock_validator();
    assert!(!v.controls_allowed());

    // driver's cancel always goes through, re-engagement spam does not
    assert!(v.should_transmit(2, MSG_GRA_ACC_01, &buttons(true, false, false)));
    assert!(!v.should_transmit(2, MSG_GRA_ACC_01, &buttons(false, false, true)));
    assert!(!v.should_transmit(2, MSG_GRA_ACC_01, &buttons(false, true, false)));

    // resume is fine once the stock ACC is engaged
    v.on_acc_status(AccStatus::Active);
    assert!(v.controls_allowed());
    assert!(v.should_transmit(2, MSG_GRA_ACC_01, &buttons(false, false, true)));
}

#[test]
fn long_mode_never_transmits_button_frames() {
    let (mut v, _clock) = long_validator();
    engage(&mut v);
    assert!(!v.should_transmit(0, MSG_GRA_ACC_01, &buttons(true, false, false)));
    assert!(!v.should_transmit(2, MSG_GRA_ACC_01, &buttons(false, false, true)));
}

#[test]
fn long_mode_set_and_resume_engage_on_falling_edge() {
    for resume in [false, true] {
        let set = !resume;
        let (mut v, _clock) = long_validator();

        // main switch off: presses are ignored outright
        v.on_acc_status(AccStatus::Off);
        v.on_cruise_buttons(false, set, resume);
        assert!(!v.controls_allowed(), "engaged with main switch off");

        // main switch on: the press itself must not engage
        v.on_acc_status(AccStatus::Standby);
        v.on_cruise_buttons(false, set, resume);
        assert!(!v.controls_allowed(), "engaged on rising edge");

        // the release does
        v.on_cruise_buttons(false, false, false);
        assert!(v.controls_allowed(), "not engaged on falling edge");
    }
}

#[test]
fn long_mode_cancel_button_disengages() {
    let (mut v, _clock) = long_validator();
    engage(&mut v);
    v.on_cruise_buttons(true, false, false);
    assert!(!v.controls_allowed());
}

#[test]
fn long_mode_main_switch_off_disengages() {
    let (mut v, _clock) = long_validator();
    engage(&mut v);
    v.on_acc_status(AccStatus::Off);
    assert!(!v.controls_allowed());
}

#[test]
fn accel_bounds_swept_for_both_engagement_states() {
    let profile = profiles::volkswagen_mqb(true);
    let (min_accel, max_accel) = (profile.accel.min_accel, profile.accel.max_accel);

    for controls_allowed in [true, false] {
        let (mut v, _clock) = long_validator();
        if controls_allowed {
            engage(&mut v);
        }

        // hundredths from one below the floor to one above the ceiling
        let lo = ((min_accel - 1.0) * 100.0) as i64;
        let hi = ((max_accel + 1.0) * 100.0) as i64;
        for hundredths in lo..=hi {
            let accel = hundredths as f64 / 100.0;
            let expected = if controls_allowed {
                accel >= min_accel && accel <= max_accel
            } else {
                accel == 0.0
            };

            // primary request used by the ECU
            assert_eq!(
                v.should_transmit(0, MSG_ACC_06, &accel_request(accel)),
                expected,
                "ACC_06 accel {} controls_allowed {}",
                accel,
                controls_allowed
            );
            // redundant request used by ABS/ESP
            assert_eq!(
                v.should_transmit(0, MSG_ACC_07, &accel_request(accel)),
                expected,
                "ACC_07 accel {} controls_allowed {}",
                accel,
                controls_allowed
            );
            // the optional secondary field stays disabled for now
            let with_secondary = TxCommand::AccelRequest { accel, secondary_accel: accel };
            assert!(
                !v.should_transmit(0, MSG_ACC_07, &with_secondary),
                "secondary accel {} passed",
                accel
            );
        }
    }
}

#[test]
fn steering_rate_limits_enforced() {
    let (mut v, _clock) = long_validator();
    engage(&mut v);

    // full torque in one step is blocked, a rate-up step is not
    assert!(!v.should_transmit(0, MSG_HCA_01, &steering(300)));
    assert!(v.should_transmit(0, MSG_HCA_01, &steering(4)));

    // ten rate-up steps from rest walk out to 40, each one allowed
    let (mut v, _clock) = long_validator();
    engage(&mut v);
    for step in 1..=10 {
        assert!(
            v.should_transmit(0, MSG_HCA_01, &steering(step * 4)),
            "step to {}",
            step * 4
        );
    }
}

#[test]
fn steering_disengaged_allows_only_neutral() {
    let (mut v, _clock) = long_validator();
    assert!(!v.controls_allowed());
    assert!(v.should_transmit(0, MSG_HCA_01, &steering(0)));
    assert!(!v.should_transmit(0, MSG_HCA_01, &steering(4)));
    assert!(!v.should_transmit(0, MSG_HCA_01, &steering(-4)));
}

#[test]
fn steering_rt_interval_caps_cumulative_drift() {
    let (mut v, clock) = long_validator();
    let limits = profiles::volkswagen_mqb(true).torque;
    engage(&mut v);

    // with the clock frozen the anchor never refreshes: legal steps stall
    // at max_rt_delta
    let mut torque = 0;
    while v.should_transmit(0, MSG_HCA_01, &steering(torque + limits.max_rate_up)) {
        torque += limits.max_rate_up;
        assert!(torque <= limits.max_rt_delta, "drifted past the rt bound");
    }
    assert!(torque + limits.max_rate_up > limits.max_rt_delta);

    // once the interval elapses, the next in-bound command re-anchors and
    // the ramp can continue from there
    clock.advance_us(limits.rt_interval_us + 1);
    assert!(v.should_transmit(0, MSG_HCA_01, &steering(torque)));
    assert!(v.should_transmit(0, MSG_HCA_01, &steering(torque + limits.max_rate_up)));
}

#[test]
fn driver_override_shrinks_the_command_cap() {
    let (mut v, clock) = long_validator();
    let limits = profiles::volkswagen_mqb(true).torque;
    engage(&mut v);

    // driver torques hard against the positive command direction
    let opposing = -(limits.driver_torque_allowance + 10);
    for _ in 0..2 {
        v.on_driver_torque(opposing);
    }
    let cap = limits.max_torque - 10 * limits.driver_torque_factor;

    // the command can still ramp, but only up to the reduced cap
    let mut torque = 0;
    while torque < cap {
        torque = (torque + limits.max_rate_up).min(cap);
        clock.advance_us(limits.rt_interval_us + 1);
        assert!(v.should_transmit(0, MSG_HCA_01, &steering(torque)), "blocked at {}", torque);
    }
    clock.advance_us(limits.rt_interval_us + 1);
    assert!(!v.should_transmit(0, MSG_HCA_01, &steering(cap + 1)));
}

#[test]
fn forwarding_blacklists_authored_frames() {
    // stock mode owns steering and lane HUD frames
    let mut v = stock_validator();
    assert_eq!(v.should_forward(2, MSG_HCA_01), None);
    assert_eq!(v.should_forward(2, MSG_LDW_02), None);
    // stock ACC frames still flow to the vehicle
    assert_eq!(v.should_forward(2, MSG_ACC_06), Some(0));

    // long mode additionally owns the ACC frames
    let (mut v, _clock) = long_validator();
    for id in [MSG_HCA_01, MSG_LDW_02, MSG_ACC_02, MSG_ACC_06, MSG_ACC_07] {
        assert_eq!(v.should_forward(2, id), None, "0x{:X} relayed", id);
    }

    // unrelated traffic is relayed per the bus map in both directions
    assert_eq!(v.should_forward(0, 0x3DC), Some(2));
    assert_eq!(v.should_forward(2, 0x3DC), Some(0));
}

#[test]
fn relay_malfunction_is_sticky_until_reinit() {
    let (mut v, _clock) = long_validator();
    engage(&mut v);

    // the device's own steering address showing up on bus 0 means the
    // relay path is compromised
    assert_eq!(v.should_forward(0, MSG_HCA_01), None);
    assert!(v.relay_malfunction());
    assert!(!v.controls_allowed());

    // engagement is refused while the latch holds
    engage_attempt(&mut v);
    assert!(!v.controls_allowed());
    assert!(!v.should_transmit(0, MSG_HCA_01, &steering(4)));

    v.reinit();
    assert!(!v.relay_malfunction());
    engage(&mut v);
    assert!(v.should_transmit(0, MSG_HCA_01, &steering(4)));
}

/// Like `engage` but without asserting success
fn engage_attempt(v: &mut SafetyValidator) {
    v.on_acc_status(AccStatus::Standby);
    v.on_cruise_buttons(false, true, false);
    v.on_cruise_buttons(false, false, false);
}

#[test]
fn disengaging_mid_stream_blocks_further_commands() {
    let (mut v, _clock) = long_validator();
    engage(&mut v);
    assert!(v.should_transmit(0, MSG_HCA_01, &steering(4)));

    disengage(&mut v);
    assert!(!v.should_transmit(0, MSG_HCA_01, &steering(8)));
    assert!(!v.should_transmit(0, MSG_ACC_06, &accel_request(0.5)));
    // neutral commands stay transmittable
    assert!(v.should_transmit(0, MSG_HCA_01, &steering(0)));
    assert!(v.should_transmit(0, MSG_ACC_06, &accel_request(0.0)));
}
