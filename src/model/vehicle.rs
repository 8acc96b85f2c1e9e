use crate::model::topology::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Different types of vehicles in the simulation. The factor multiplies the
/// base travel and crossing times, so higher means slower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VehicleType {
    #[default]
    Car,
    Bus,
    Truck,
}

impl VehicleType {
    /// Multiplicative factor applied to road travel and crossing times.
    pub fn speed_factor(self) -> u64 {
        match self {
            VehicleType::Car => 1,
            VehicleType::Bus => 2,
            VehicleType::Truck => 3,
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VehicleType::Car => write!(f, "Car"),
            VehicleType::Bus => write!(f, "Bus"),
            VehicleType::Truck => write!(f, "Truck"),
        }
    }
}

/// A vehicle traveling through the road network. Exactly one worker owns a
/// vehicle at any time; ownership transfers at each queue hand-off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Unique identifier, `<entrance>-<sequence>`.
    pub id: String,
    pub vehicle_type: VehicleType,
    /// The assigned node sequence from entrance to exit. Immutable once chosen.
    pub path: Vec<NodeId>,
    /// Wall-clock entrance timestamp in milliseconds.
    pub entered_ms: u64,
    /// Wall-clock exit timestamp, set once at the exit node.
    #[serde(default)]
    pub exited_ms: Option<u64>,
}

impl Vehicle {
    pub fn new(id: String, vehicle_type: VehicleType, path: Vec<NodeId>) -> Self {
        Vehicle {
            id,
            vehicle_type,
            path,
            entered_ms: current_millis(),
            exited_ms: None,
        }
    }

    /// The node following `at` in this vehicle's path, or `None` when `at`
    /// is the final node (or not on the path at all).
    pub fn next_hop(&self, at: NodeId) -> Option<NodeId> {
        let pos = self.path.iter().position(|n| *n == at)?;
        self.path.get(pos + 1).copied()
    }

    /// Marks the vehicle as having left the network. The exit timestamp is
    /// clamped so it never precedes the entrance timestamp.
    pub fn record_exit(&mut self) {
        if self.exited_ms.is_none() {
            self.exited_ms = Some(current_millis().max(self.entered_ms));
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
