use crate::model::topology::{road_between, NodeId};
use crate::model::vehicle::{Vehicle, VehicleType};
use crate::monitoring::hub::EventHub;
use crate::network::sender::RoadSender;
use std::sync::{Arc, Mutex};

/// Journey bookkeeping for a vehicle that reached the exit.
#[derive(Debug, Clone)]
pub struct JourneyRecord {
    pub vehicle_id: String,
    pub vehicle_type: VehicleType,
    pub entered_ms: u64,
    pub exited_ms: u64,
}

/// Records every completed journey at an exit node. Read-only snapshots are
/// part of the dashboard boundary.
#[derive(Debug, Default)]
pub struct ExitLog {
    records: Mutex<Vec<JourneyRecord>>,
}

impl ExitLog {
    pub fn new() -> Self {
        ExitLog {
            records: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, vehicle: &Vehicle) {
        let exited_ms = vehicle.exited_ms.unwrap_or(vehicle.entered_ms);
        self.records.lock().unwrap().push(JourneyRecord {
            vehicle_id: vehicle.id.clone(),
            vehicle_type: vehicle.vehicle_type,
            entered_ms: vehicle.entered_ms,
            exited_ms,
        });
    }

    pub fn records(&self) -> Vec<JourneyRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn completed(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

/// Routes a vehicle released by a traffic light: either onward along the
/// next road of its path, or into exit bookkeeping when the path ends here.
pub struct Sorter {
    node: NodeId,
    hub: Arc<EventHub>,
    sender: Arc<RoadSender>,
    exits: Arc<ExitLog>,
}

impl Sorter {
    pub fn new(
        node: NodeId,
        hub: Arc<EventHub>,
        sender: Arc<RoadSender>,
        exits: Arc<ExitLog>,
    ) -> Self {
        Sorter {
            node,
            hub,
            sender,
            exits,
        }
    }

    pub async fn dispatch(&self, mut vehicle: Vehicle) {
        match vehicle.next_hop(self.node) {
            None => {
                vehicle.record_exit();
                self.hub.vehicle_exit(&vehicle);
                let journey_ms = vehicle
                    .exited_ms
                    .unwrap_or(vehicle.entered_ms)
                    .saturating_sub(vehicle.entered_ms);
                println!(
                    "Vehicle {} {} left the network at {} after {} ms",
                    vehicle.vehicle_type, vehicle.id, self.node, journey_ms
                );
                self.exits.record(&vehicle);
            }
            Some(next) => match road_between(self.node, next) {
                Some(road) => {
                    let ts = self.hub.vehicle_departure(road.id, &vehicle);
                    self.sender.send(&road, &vehicle, ts).await;
                }
                None => {
                    // A path naming a road that does not exist is a static
                    // topology defect, not a recoverable condition.
                    log::warn!(
                        "{}: no road to {}, dropping vehicle {}",
                        self.node,
                        next,
                        vehicle.id
                    );
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::topology::NodeId;

    fn sorter_at(node: NodeId) -> (Sorter, Arc<ExitLog>) {
        let (hub, _rx) = EventHub::detached(node);
        let exits = Arc::new(ExitLog::new());
        let sorter = Sorter::new(node, hub, Arc::new(RoadSender::new()), Arc::clone(&exits));
        (sorter, exits)
    }

    #[tokio::test]
    async fn path_end_goes_to_exit_bookkeeping() {
        let (sorter, exits) = sorter_at(NodeId::S);
        let vehicle = Vehicle::new(
            "E3-0009".to_string(),
            VehicleType::Car,
            vec![NodeId::E3, NodeId::Cr3, NodeId::S],
        );
        sorter.dispatch(vehicle).await;
        let records = exits.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].vehicle_id, "E3-0009");
        assert!(records[0].exited_ms >= records[0].entered_ms);
    }

    #[tokio::test]
    async fn unmatched_road_drops_the_vehicle() {
        let (sorter, exits) = sorter_at(NodeId::Cr1);
        // CR1 has no road back to an entrance.
        let vehicle = Vehicle::new(
            "E1-0002".to_string(),
            VehicleType::Bus,
            vec![NodeId::Cr1, NodeId::E1],
        );
        sorter.dispatch(vehicle).await;
        assert_eq!(exits.completed(), 0);
    }
}
