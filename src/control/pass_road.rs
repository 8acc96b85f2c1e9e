use crate::config::{MIN_SPACING_MS, TICK_MS};
use crate::model::topology::Road;
use crate::model::vehicle::Vehicle;
use crate::monitoring::hub::EventHub;
use crate::sync::queue::ConcurrentQueue;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration, Instant};

/// Simulates travel along one road segment: turns the stream of vehicles
/// entering the road into a time-ordered stream of signal arrivals while
/// preserving input order and a minimum inter-arrival spacing.
pub struct PassRoad {
    road: Road,
    arrivals: Arc<ConcurrentQueue<Vehicle>>,
    signal_queue: Arc<ConcurrentQueue<Vehicle>>,
    hub: Arc<EventHub>,
    running: Arc<AtomicBool>,
}

/// Picks the finish time for a newly arrived vehicle. When the previous
/// vehicle is still scheduled to finish later than this one naturally would
/// (a faster vehicle behind a slower one), the new finish is clamped to the
/// previous finish plus the minimum spacing so nobody overtakes.
pub fn schedule_finish(
    last_scheduled: Option<Instant>,
    natural_finish: Instant,
    spacing: Duration,
) -> Instant {
    match last_scheduled {
        Some(last) if last > natural_finish => last + spacing,
        _ => natural_finish,
    }
}

impl PassRoad {
    pub fn new(
        road: Road,
        arrivals: Arc<ConcurrentQueue<Vehicle>>,
        signal_queue: Arc<ConcurrentQueue<Vehicle>>,
        hub: Arc<EventHub>,
        running: Arc<AtomicBool>,
    ) -> Self {
        PassRoad {
            road,
            arrivals,
            signal_queue,
            hub,
            running,
        }
    }

    fn travel_time(&self, vehicle: &Vehicle) -> Duration {
        Duration::from_millis(vehicle.vehicle_type.speed_factor() * self.road.travel_ms)
    }

    /// Worker loop. Checks the running flag between iterations; vehicles
    /// still in transit when the simulation stops are abandoned.
    pub async fn run(self) {
        let spacing = Duration::from_millis(MIN_SPACING_MS);
        let mut in_transit: VecDeque<(Instant, Vehicle)> = VecDeque::new();

        while self.running.load(Ordering::Relaxed) {
            while let Some(vehicle) = self.arrivals.try_pop() {
                let natural = Instant::now() + self.travel_time(&vehicle);
                let finish = schedule_finish(
                    in_transit.back().map(|(t, _)| *t),
                    natural,
                    spacing,
                );
                in_transit.push_back((finish, vehicle));
            }

            let due = in_transit
                .front()
                .map(|(finish, _)| Instant::now() >= *finish)
                .unwrap_or(false);
            if due {
                if let Some((_, vehicle)) = in_transit.pop_front() {
                    println!(
                        "Vehicle {} {} finished road {}",
                        vehicle.vehicle_type, vehicle.id, self.road.id
                    );
                    self.hub.vehicle_signal_arrival(self.road.id, &vehicle);
                    self.signal_queue.push(vehicle);
                }
                continue;
            }

            sleep(Duration::from_millis(TICK_MS)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::topology::{road_between, NodeId};
    use crate::model::vehicle::VehicleType;

    fn vehicle(id: &str, vehicle_type: VehicleType) -> Vehicle {
        Vehicle::new(
            id.to_string(),
            vehicle_type,
            vec![NodeId::E3, NodeId::Cr3, NodeId::S],
        )
    }

    #[tokio::test(start_paused = true)]
    async fn natural_finish_is_used_when_road_is_clear() {
        let now = Instant::now();
        let natural = now + Duration::from_millis(2000);
        assert_eq!(
            schedule_finish(None, natural, Duration::from_millis(200)),
            natural
        );
        let earlier = now + Duration::from_millis(1000);
        assert_eq!(
            schedule_finish(Some(earlier), natural, Duration::from_millis(200)),
            natural
        );
    }

    #[tokio::test(start_paused = true)]
    async fn faster_vehicle_is_clamped_behind_slower_one() {
        let now = Instant::now();
        let slow_finish = now + Duration::from_millis(6000);
        let natural = now + Duration::from_millis(2000);
        let spacing = Duration::from_millis(200);
        assert_eq!(
            schedule_finish(Some(slow_finish), natural, spacing),
            slow_finish + spacing
        );
    }

    #[tokio::test(start_paused = true)]
    async fn output_order_equals_input_order() {
        let road = road_between(NodeId::E3, NodeId::Cr3).unwrap();
        let arrivals = Arc::new(ConcurrentQueue::new());
        let signal_queue = Arc::new(ConcurrentQueue::new());
        let (hub, _rx) = EventHub::detached(NodeId::Cr3);
        let running = Arc::new(AtomicBool::new(true));

        // A slow truck enters first, a fast car right behind it.
        arrivals.push(vehicle("E3-0001", VehicleType::Truck));
        arrivals.push(vehicle("E3-0002", VehicleType::Car));

        let worker = PassRoad::new(
            road,
            Arc::clone(&arrivals),
            Arc::clone(&signal_queue),
            hub,
            Arc::clone(&running),
        );
        let handle = tokio::spawn(worker.run());

        // Truck needs 6000ms; the car would naturally finish in 2000ms but
        // must stay behind. Advance virtual time past both finishes.
        tokio::time::sleep(Duration::from_millis(7000)).await;

        assert_eq!(signal_queue.try_pop().unwrap().id, "E3-0001");
        assert_eq!(signal_queue.try_pop().unwrap().id, "E3-0002");
        running.store(false, Ordering::Relaxed);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn vehicle_is_held_for_its_full_travel_time() {
        let road = road_between(NodeId::Cr3, NodeId::S).unwrap();
        let arrivals = Arc::new(ConcurrentQueue::new());
        let signal_queue = Arc::new(ConcurrentQueue::new());
        let (hub, _rx) = EventHub::detached(NodeId::S);
        let running = Arc::new(AtomicBool::new(true));

        arrivals.push(vehicle("E3-0003", VehicleType::Car));
        let worker = PassRoad::new(
            road,
            arrivals,
            Arc::clone(&signal_queue),
            hub,
            Arc::clone(&running),
        );
        let handle = tokio::spawn(worker.run());

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(signal_queue.is_empty());
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(signal_queue.len(), 1);
        running.store(false, Ordering::Relaxed);
        handle.await.unwrap();
    }
}
