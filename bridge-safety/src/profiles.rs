//! Built-in vehicle profiles
//!
//! The Volkswagen MQB platform is the illustration model: its numeric
//! limits and message catalog exercise every part of the validator. Other
//! platforms are additional data, not additional code.

use crate::config::{AccelLimits, BusRemap, ForwardBlock, TorqueLimits, VehicleProfile};
use crate::types::{MessageId, TxKind};

// MQB message IDs
pub const MSG_ESP_19: MessageId = 0xB2; // RX from ABS, wheel speeds
pub const MSG_LH_EPS_03: MessageId = 0x9F; // RX from EPS, driver steering torque
pub const MSG_ESP_05: MessageId = 0x106; // RX from ABS, brake light state
pub const MSG_TSK_06: MessageId = 0x120; // RX from ECU, ACC status
pub const MSG_MOTOR_20: MessageId = 0x121; // RX from ECU, driver throttle
pub const MSG_ACC_06: MessageId = 0x122; // TX, ACC acceleration request
pub const MSG_HCA_01: MessageId = 0x126; // TX, heading control assist torque
pub const MSG_GRA_ACC_01: MessageId = 0x12B; // TX, cruise control buttons
pub const MSG_ACC_07: MessageId = 0x12E; // TX, ACC acceleration request (with secondary field)
pub const MSG_ACC_02: MessageId = 0x30C; // TX, ACC HUD data
pub const MSG_LDW_02: MessageId = 0x397; // TX, lane departure warning HUD

/// Volkswagen MQB profile
///
/// `longitudinal` selects full longitudinal control (engagement from the
/// button state machine, ACC frames transmitted and blacklisted from
/// forwarding) versus the stock-ACC integration (lateral only, button
/// passthrough with the spam policy).
pub fn volkswagen_mqb(longitudinal: bool) -> VehicleProfile {
    let torque = TorqueLimits {
        max_torque: 300,
        max_rate_up: 4,
        max_rate_down: 10,
        max_rt_delta: 75,
        rt_interval_us: 250_000,
        driver_torque_allowance: 80,
        driver_torque_factor: 3,
        driver_torque_range: 1023,
    };

    let accel = AccelLimits {
        min_accel: -3.5,
        max_accel: 2.0,
        secondary_accel_inactive: 3.02,
        secondary_accel_enabled: false,
    };

    let tx_allowlist = if longitudinal {
        vec![
            (MSG_HCA_01, 0, TxKind::Steering),
            (MSG_LDW_02, 0, TxKind::Hud),
            (MSG_ACC_02, 0, TxKind::Hud),
            (MSG_ACC_06, 0, TxKind::AccelRequest),
            (MSG_ACC_07, 0, TxKind::AccelRequest),
        ]
    } else {
        vec![
            (MSG_HCA_01, 0, TxKind::Steering),
            (MSG_LDW_02, 0, TxKind::Hud),
            (MSG_GRA_ACC_01, 0, TxKind::CruiseButtons),
            (MSG_GRA_ACC_01, 2, TxKind::CruiseButtons),
        ]
    }
    .into_iter()
    .map(|(id, bus, kind)| crate::config::TxMessage::new(id, bus, kind))
    .collect();

    // frames the device authors itself are never relayed from the camera
    // side, so the vehicle never sees a conflicting duplicate
    let blacklisted = if longitudinal {
        vec![MSG_HCA_01, MSG_LDW_02, MSG_ACC_02, MSG_ACC_06, MSG_ACC_07]
    } else {
        vec![MSG_HCA_01, MSG_LDW_02]
    };
    let forward_blacklist = blacklisted
        .into_iter()
        .map(|id| ForwardBlock { bus: 2, id })
        .collect();

    VehicleProfile {
        name: format!(
            "volkswagen_mqb_{}",
            if longitudinal { "long" } else { "stock" }
        ),
        longitudinal_control_enabled: longitudinal,
        torque,
        accel,
        tx_allowlist,
        forward_blacklist,
        bus_map: vec![
            BusRemap { source: 0, target: 2 },
            BusRemap { source: 2, target: 0 },
        ],
        relay_malfunction_id: MSG_HCA_01,
        relay_malfunction_bus: 0,
        standstill_threshold: 1.0,
    }
}
