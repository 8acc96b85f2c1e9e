use crate::model::topology::{LightState, NodeId, RoadId};
use crate::model::vehicle::Vehicle;
use serde::{Deserialize, Serialize};

/// Everything observable in the simulation. Events are immutable once built
/// and are the only objects that cross the network boundary or reach the
/// event aggregator. `ts` is the emitting node's logical clock value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    NewVehicle {
        node: NodeId,
        ts: u64,
        vehicle: Vehicle,
    },
    VehicleDeparture {
        node: NodeId,
        ts: u64,
        road: RoadId,
        vehicle: Vehicle,
    },
    VehicleRoadArrival {
        node: NodeId,
        ts: u64,
        road: RoadId,
        vehicle: Vehicle,
    },
    VehicleSignalArrival {
        node: NodeId,
        ts: u64,
        road: RoadId,
        vehicle: Vehicle,
    },
    VehicleExit {
        node: NodeId,
        ts: u64,
        vehicle: Vehicle,
    },
    SignalChange {
        node: NodeId,
        ts: u64,
        road: RoadId,
        state: LightState,
    },
}

impl Event {
    pub fn timestamp(&self) -> u64 {
        match self {
            Event::NewVehicle { ts, .. }
            | Event::VehicleDeparture { ts, .. }
            | Event::VehicleRoadArrival { ts, .. }
            | Event::VehicleSignalArrival { ts, .. }
            | Event::VehicleExit { ts, .. }
            | Event::SignalChange { ts, .. } => *ts,
        }
    }

    pub fn node(&self) -> NodeId {
        match self {
            Event::NewVehicle { node, .. }
            | Event::VehicleDeparture { node, .. }
            | Event::VehicleRoadArrival { node, .. }
            | Event::VehicleSignalArrival { node, .. }
            | Event::VehicleExit { node, .. }
            | Event::SignalChange { node, .. } => *node,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::NewVehicle { .. } => "NewVehicle",
            Event::VehicleDeparture { .. } => "VehicleDeparture",
            Event::VehicleRoadArrival { .. } => "VehicleRoadArrival",
            Event::VehicleSignalArrival { .. } => "VehicleSignalArrival",
            Event::VehicleExit { .. } => "VehicleExit",
            Event::SignalChange { .. } => "SignalChange",
        }
    }

    pub fn vehicle(&self) -> Option<&Vehicle> {
        match self {
            Event::NewVehicle { vehicle, .. }
            | Event::VehicleDeparture { vehicle, .. }
            | Event::VehicleRoadArrival { vehicle, .. }
            | Event::VehicleSignalArrival { vehicle, .. }
            | Event::VehicleExit { vehicle, .. } => Some(vehicle),
            Event::SignalChange { .. } => None,
        }
    }

    pub fn road(&self) -> Option<RoadId> {
        match self {
            Event::VehicleDeparture { road, .. }
            | Event::VehicleRoadArrival { road, .. }
            | Event::VehicleSignalArrival { road, .. }
            | Event::SignalChange { road, .. } => Some(*road),
            Event::NewVehicle { .. } | Event::VehicleExit { .. } => None,
        }
    }
}
