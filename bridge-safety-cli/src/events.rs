//! Trace event model
//!
//! A trace is a JSON Lines file: one record per line, each a typed signal
//! observation, an outbound transmission candidate, or a forwarding query,
//! in bus order. Timestamps are microseconds on the recording device's
//! monotonic clock and drive the validator's real-time torque check during
//! replay.

use bridge_safety::{AccStatus, Bus, Clock, MessageId};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

/// One line of a trace file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Microseconds on the recorder's monotonic clock
    pub ts_us: u64,
    #[serde(flatten)]
    pub event: TraceEvent,
}

/// The event payload, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    // --- received observations ---
    DriverTorque { torque: i32 },
    Brake { active: bool },
    DriverGas { value: f64 },
    AccStatus { status: AccStatus },
    WheelSpeeds { speeds: Vec<f64> },
    CruiseButtons { cancel: bool, set: bool, resume: bool },

    // --- outbound transmission candidates ---
    TxSteering { bus: Bus, id: MessageId, torque: i32, steer_req: bool },
    TxAccel { bus: Bus, id: MessageId, accel: f64, secondary_accel: f64 },
    TxButtons { bus: Bus, id: MessageId, cancel: bool, set: bool, resume: bool },
    TxHud { bus: Bus, id: MessageId },

    // --- forwarding queries ---
    Forward { bus: Bus, id: MessageId },
}

/// Clock fed from trace timestamps instead of wall time
///
/// The replay loop sets it to each record's timestamp before the record is
/// offered to the validator, so the real-time delta check sees the same
/// time base the device saw.
#[derive(Clone)]
pub struct ReplayClock(Rc<Cell<u64>>);

impl ReplayClock {
    pub fn new() -> Self {
        ReplayClock(Rc::new(Cell::new(0)))
    }

    pub fn set_us(&self, ts_us: u64) {
        self.0.set(ts_us);
    }
}

impl Default for ReplayClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ReplayClock {
    fn now_us(&self) -> u64 {
        self.0.get()
    }
}
