//! Cruise control engagement state machine
//!
//! Debounces the set/resume/cancel buttons and the ACC main switch into
//! engage/disengage decisions. Engagement follows press/release semantics:
//! a button *release* (falling edge) engages, never the press itself, and
//! only while the main switch is on. In lateral-only mode the machine
//! instead mirrors the vehicle's own cruise engagement status.

use crate::types::AccStatus;

/// Engagement decision produced by one processed sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engagement {
    Engage,
    Disengage,
}

/// One-sample-deep edge detector over the cruise control inputs
///
/// Holds only the previous sample of each input; no further history.
#[derive(Debug, Clone)]
pub struct ButtonStateMachine {
    /// True when the device runs full longitudinal control and engagement
    /// is derived from the buttons; false when the stock ACC status drives it
    longitudinal: bool,
    main_switch_on: bool,
    stock_cruise_engaged: bool,
    prev_cancel: bool,
    prev_set: bool,
    prev_resume: bool,
}

impl ButtonStateMachine {
    pub fn new(longitudinal: bool) -> Self {
        Self {
            longitudinal,
            main_switch_on: false,
            stock_cruise_engaged: false,
            prev_cancel: false,
            prev_set: false,
            prev_resume: false,
        }
    }

    /// Process one ACC status sample from the vehicle
    ///
    /// Full longitudinal: only the main-switch level matters, and observing
    /// it off disengages immediately (level-triggered, not an edge).
    /// Lateral-only: engagement mirrors the stock ACC, engaging on its
    /// rising edge and disengaging the moment it reads anything but active.
    pub fn on_acc_status(&mut self, status: AccStatus) -> Option<Engagement> {
        self.main_switch_on = status.main_switch_on();

        if self.longitudinal {
            if !self.main_switch_on {
                // stale button samples must not engage once the switch returns
                self.prev_set = false;
                self.prev_resume = false;
                return Some(Engagement::Disengage);
            }
            return None;
        }

        let engaged = status == AccStatus::Active;
        let was_engaged = self.stock_cruise_engaged;
        self.stock_cruise_engaged = engaged;

        if engaged && !was_engaged {
            Some(Engagement::Engage)
        } else if !engaged {
            Some(Engagement::Disengage)
        } else {
            None
        }
    }

    /// Process one cruise button sample
    ///
    /// Only meaningful in full longitudinal mode; the stock integration
    /// never derives engagement from button frames.
    pub fn on_buttons(&mut self, cancel: bool, set: bool, resume: bool) -> Option<Engagement> {
        if !self.longitudinal {
            return None;
        }

        if !self.main_switch_on {
            // presses are ignored entirely while the switch is off
            self.prev_cancel = cancel;
            self.prev_set = false;
            self.prev_resume = false;
            return None;
        }

        let cancel_pressed = cancel && !self.prev_cancel;
        let set_released = !set && self.prev_set;
        let resume_released = !resume && self.prev_resume;

        self.prev_cancel = cancel;
        self.prev_set = set;
        self.prev_resume = resume;

        if cancel_pressed {
            Some(Engagement::Disengage)
        } else if set_released || resume_released {
            Some(Engagement::Engage)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.main_switch_on = false;
        self.stock_cruise_engaged = false;
        self.prev_cancel = false;
        self.prev_set = false;
        self.prev_resume = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_machine_with_switch_on() -> ButtonStateMachine {
        let mut sm = ButtonStateMachine::new(true);
        assert_eq!(sm.on_acc_status(AccStatus::Standby), None);
        sm
    }

    #[test]
    fn test_engage_on_release_not_press() {
        for resume in [false, true] {
            let mut sm = long_machine_with_switch_on();
            // press
            assert_eq!(sm.on_buttons(false, !resume, resume), None);
            // release engages
            assert_eq!(sm.on_buttons(false, false, false), Some(Engagement::Engage));
        }
    }

    #[test]
    fn test_presses_ignored_while_switch_off() {
        let mut sm = ButtonStateMachine::new(true);
        assert_eq!(sm.on_acc_status(AccStatus::Off), Some(Engagement::Disengage));
        assert_eq!(sm.on_buttons(false, true, false), None);
        assert_eq!(sm.on_buttons(false, false, false), None);

        // a press latched while off must not engage after the switch returns
        assert_eq!(sm.on_buttons(false, true, false), None);
        assert_eq!(sm.on_acc_status(AccStatus::Standby), None);
        assert_eq!(sm.on_buttons(false, false, false), None);
    }

    #[test]
    fn test_cancel_rising_edge_disengages() {
        let mut sm = long_machine_with_switch_on();
        assert_eq!(sm.on_buttons(true, false, false), Some(Engagement::Disengage));
        // held cancel is not a new edge
        assert_eq!(sm.on_buttons(true, false, false), None);
    }

    #[test]
    fn test_cancel_wins_over_release() {
        let mut sm = long_machine_with_switch_on();
        assert_eq!(sm.on_buttons(false, true, false), None);
        // cancel pressed in the same sample as the set release
        assert_eq!(sm.on_buttons(true, false, false), Some(Engagement::Disengage));
    }

    #[test]
    fn test_main_switch_off_is_level_triggered() {
        let mut sm = long_machine_with_switch_on();
        assert_eq!(sm.on_acc_status(AccStatus::Off), Some(Engagement::Disengage));
        // still off, still disengaging
        assert_eq!(sm.on_acc_status(AccStatus::Off), Some(Engagement::Disengage));
    }

    #[test]
    fn test_lateral_mode_follows_stock_acc() {
        let mut sm = ButtonStateMachine::new(false);
        assert_eq!(sm.on_acc_status(AccStatus::Standby), Some(Engagement::Disengage));
        assert_eq!(sm.on_acc_status(AccStatus::Active), Some(Engagement::Engage));
        // no repeated engage while it stays active
        assert_eq!(sm.on_acc_status(AccStatus::Active), None);
        assert_eq!(sm.on_acc_status(AccStatus::Standby), Some(Engagement::Disengage));

        // buttons never engage in lateral mode
        assert_eq!(sm.on_buttons(false, true, false), None);
        assert_eq!(sm.on_buttons(false, false, false), None);
    }
}
