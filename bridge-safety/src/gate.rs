//! Forwarding and transmission gate
//!
//! Table-driven policy built once from the vehicle profile: a per-source-bus
//! forwarding blacklist, the bus remap, and the outbound message catalog.
//! Also owns the relay malfunction latch: the one address the device must
//! be the sole transmitter of, observed arriving on that very bus, is proof
//! the relay path is compromised and sticks until reinitialization.

use crate::config::VehicleProfile;
use crate::types::{Bus, MessageId, TxKind};
use std::collections::{HashMap, HashSet};

/// Immutable forwarding/transmission policy plus the malfunction latch
#[derive(Debug, Clone)]
pub struct ForwardingGate {
    forward_blacklist: HashSet<(Bus, MessageId)>,
    bus_map: HashMap<Bus, Bus>,
    tx_allowlist: HashMap<(MessageId, Bus), TxKind>,
    relay_malfunction_id: MessageId,
    relay_malfunction_bus: Bus,
    relay_malfunction: bool,
}

impl ForwardingGate {
    pub fn new(profile: &VehicleProfile) -> Self {
        let forward_blacklist = profile
            .forward_blacklist
            .iter()
            .map(|block| (block.bus, block.id))
            .collect();

        let bus_map = profile
            .bus_map
            .iter()
            .map(|remap| (remap.source, remap.target))
            .collect();

        let tx_allowlist = profile
            .tx_allowlist
            .iter()
            .map(|m| ((m.id, m.bus), m.kind))
            .collect();

        Self {
            forward_blacklist,
            bus_map,
            tx_allowlist,
            relay_malfunction_id: profile.relay_malfunction_id,
            relay_malfunction_bus: profile.relay_malfunction_bus,
            relay_malfunction: false,
        }
    }

    /// Decide whether a frame received on `bus` is relayed, and where to
    ///
    /// Seeing the device's own exclusive address arrive on its transmit bus
    /// trips the relay malfunction latch and drops the frame.
    pub fn should_forward(&mut self, bus: Bus, id: MessageId) -> Option<Bus> {
        if bus == self.relay_malfunction_bus && id == self.relay_malfunction_id {
            if !self.relay_malfunction {
                log::warn!(
                    "relay malfunction: owned address 0x{:X} observed on bus {}",
                    id,
                    bus
                );
            }
            self.relay_malfunction = true;
            return None;
        }

        if self.forward_blacklist.contains(&(bus, id)) {
            return None;
        }

        self.bus_map.get(&bus).copied()
    }

    /// Look up the outbound catalog entry for `(id, bus)`; `None` means the
    /// frame is not transmittable at all (unknown IDs fail closed)
    pub fn tx_kind(&self, bus: Bus, id: MessageId) -> Option<TxKind> {
        self.tx_allowlist.get(&(id, bus)).copied()
    }

    /// Sticky until `reset`
    pub fn relay_malfunction(&self) -> bool {
        self.relay_malfunction
    }

    pub fn reset(&mut self) {
        self.relay_malfunction = false;
    }
}
