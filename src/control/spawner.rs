use crate::config::SPAWN_LAMBDA;
use crate::model::topology::{entrance_paths, road_between, NodeId};
use crate::model::vehicle::{current_millis, Vehicle, VehicleType};
use crate::monitoring::hub::EventHub;
use crate::network::sender::RoadSender;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

/// Produces new vehicles at an entrance at exponentially distributed
/// intervals, assigning each a random type and a random valid path, then
/// immediately sends it onto the first road of that path.
pub struct VehicleSpawner {
    node: NodeId,
    hub: Arc<EventHub>,
    sender: Arc<RoadSender>,
    running: Arc<AtomicBool>,
}

/// Inter-arrival delay in seconds for a uniform draw `u` in [0, 1):
/// `-ln(1-u) / lambda`.
pub fn exponential_interval(u: f64, lambda: f64) -> f64 {
    -(1.0 - u).ln() / lambda
}

/// Weighted type choice matching observed road traffic: mostly cars, some
/// buses, a few trucks.
pub fn pick_vehicle_type(roll: f64) -> VehicleType {
    if roll < 0.60 {
        VehicleType::Car
    } else if roll < 0.85 {
        VehicleType::Bus
    } else {
        VehicleType::Truck
    }
}

impl VehicleSpawner {
    pub fn new(
        node: NodeId,
        hub: Arc<EventHub>,
        sender: Arc<RoadSender>,
        running: Arc<AtomicBool>,
    ) -> Self {
        VehicleSpawner {
            node,
            hub,
            sender,
            running,
        }
    }

    /// Worker loop. The stop flag is checked between generation cycles so a
    /// vehicle already being generated is never lost or corrupted.
    pub async fn run(self) {
        let mut rng = SmallRng::seed_from_u64(current_millis() ^ self.node.port() as u64);
        let paths = entrance_paths(self.node);
        if paths.is_empty() {
            log::warn!("{} is not an entrance, spawner exiting", self.node);
            return;
        }

        let mut sequence: u64 = 0;
        while self.running.load(Ordering::Relaxed) {
            let u: f64 = rng.random();
            let delay = exponential_interval(u, SPAWN_LAMBDA);
            sleep(Duration::from_secs_f64(delay)).await;
            if !self.running.load(Ordering::Relaxed) {
                break;
            }

            sequence += 1;
            let vehicle_type = pick_vehicle_type(rng.random());
            let path = paths[rng.random_range(0..paths.len())].clone();
            let vehicle = Vehicle::new(
                format!("{}-{:04}", self.node, sequence),
                vehicle_type,
                path,
            );

            self.hub.new_vehicle(&vehicle);
            println!(
                "Spawned vehicle {} {} at {} with path {:?}",
                vehicle.vehicle_type, vehicle.id, self.node, vehicle.path
            );

            let Some(next) = vehicle.next_hop(self.node) else {
                continue;
            };
            match road_between(self.node, next) {
                Some(road) => {
                    let ts = self.hub.vehicle_departure(road.id, &vehicle);
                    self.sender.send(&road, &vehicle, ts).await;
                }
                None => {
                    log::warn!("{}: no road to {}, vehicle {} dropped", self.node, next, vehicle.id);
                }
            }
        }
    }
}
