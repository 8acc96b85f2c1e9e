use crate::model::topology::{default_path_from, NodeId, RoadId};
use crate::model::vehicle::{Vehicle, VehicleType};
use serde::{Deserialize, Serialize};

/// One vehicle-handoff message between nodes, sent as a single JSON line.
/// Everything except the vehicle id is optional on receive: a missing type
/// defaults to `Car`, a missing path is replaced by the receiving node's
/// default valid path, a missing origin road routes to the default queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub vehicle_id: String,
    #[serde(default)]
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub path: Vec<NodeId>,
    #[serde(default)]
    pub road: Option<RoadId>,
    #[serde(default)]
    pub ts: u64,
    #[serde(default)]
    pub entered_ms: u64,
}

impl WireMessage {
    pub fn from_vehicle(vehicle: &Vehicle, road: RoadId, ts: u64) -> Self {
        WireMessage {
            vehicle_id: vehicle.id.clone(),
            vehicle_type: vehicle.vehicle_type,
            path: vehicle.path.clone(),
            road: Some(road),
            ts,
            entered_ms: vehicle.entered_ms,
        }
    }

    /// Reconstructs the vehicle at the receiving node, applying the default
    /// path when none was carried.
    pub fn into_vehicle(self, at: NodeId) -> (Vehicle, Option<RoadId>) {
        let path = if self.path.is_empty() {
            default_path_from(at)
        } else {
            self.path
        };
        let vehicle = Vehicle {
            id: self.vehicle_id,
            vehicle_type: self.vehicle_type,
            path,
            entered_ms: self.entered_ms,
            exited_ms: None,
        };
        (vehicle, self.road)
    }
}

/// Serializes a message as one newline-terminated JSON line.
pub fn encode_line(message: &WireMessage) -> serde_json::Result<String> {
    serde_json::to_string(message).map(|mut line| {
        line.push('\n');
        line
    })
}
