use crate::config::{CROSSING_BASE_MS, TICK_MS};
use crate::control::sorter::Sorter;
use crate::model::topology::{LightState, Road, RoadId};
use crate::model::vehicle::Vehicle;
use crate::monitoring::hub::EventHub;
use crate::sync::arbiter::RoundRobinArbiter;
use crate::sync::queue::ConcurrentQueue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, sleep_until, Duration, Instant};

/// Shared read-only view of the per-road signal states at one node. The
/// dashboard consumes snapshots of this map and never mutates it.
pub type SignalBoard = Arc<Mutex<HashMap<RoadId, LightState>>>;

/// Per-road GREEN/RED state machine. Holds the crossroad's round-robin turn
/// while green, releases queued vehicles that still fit into the green
/// window, then goes red and blocks for the next turn. The red duration is
/// exactly the time spent waiting on the arbiter, not a fixed sleep.
pub struct TrafficLight {
    road: Road,
    slot: usize,
    queue: Arc<ConcurrentQueue<Vehicle>>,
    arbiter: Arc<RoundRobinArbiter>,
    sorter: Arc<Sorter>,
    hub: Arc<EventHub>,
    signals: SignalBoard,
    running: Arc<AtomicBool>,
}

/// True when a crossing that takes `pass` can still complete inside the
/// green window ending at `window_end`.
pub fn fits_in_window(now: Instant, window_end: Instant, pass: Duration) -> bool {
    now + pass <= window_end
}

/// Deterministic crossing time: type factor times the base crossing time,
/// integer millisecond multiplication.
pub fn crossing_time(vehicle: &Vehicle) -> Duration {
    Duration::from_millis(vehicle.vehicle_type.speed_factor() * CROSSING_BASE_MS)
}

impl TrafficLight {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        road: Road,
        slot: usize,
        queue: Arc<ConcurrentQueue<Vehicle>>,
        arbiter: Arc<RoundRobinArbiter>,
        sorter: Arc<Sorter>,
        hub: Arc<EventHub>,
        signals: SignalBoard,
        running: Arc<AtomicBool>,
    ) -> Self {
        TrafficLight {
            road,
            slot,
            queue,
            arbiter,
            sorter,
            hub,
            signals,
            running,
        }
    }

    fn set_signal(&self, state: LightState) {
        self.signals.lock().unwrap().insert(self.road.id, state);
        self.hub.signal_change(self.road.id, state);
        println!("Signal {} switching to {:?}", self.road.id, state);
    }

    /// Worker loop: one green/red cycle per arbiter turn.
    pub async fn run(self) {
        while self.running.load(Ordering::Relaxed) {
            if !self.arbiter.await_turn(self.slot).await {
                break;
            }
            if !self.running.load(Ordering::Relaxed) {
                self.arbiter.end_turn();
                break;
            }

            self.set_signal(LightState::Green);
            let window_end = Instant::now() + Duration::from_millis(self.road.green_ms);
            self.serve_green_window(window_end).await;
            self.set_signal(LightState::Red);
            self.arbiter.end_turn();
        }
    }

    /// Releases vehicles until the green window closes. A vehicle whose
    /// crossing would overrun the window stays queued for the next cycle,
    /// and since the queue is FIFO nothing behind it may pass either.
    async fn serve_green_window(&self, window_end: Instant) {
        while self.running.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now >= window_end {
                return;
            }
            let Some(head) = self.queue.peek() else {
                let remaining = window_end - now;
                sleep(Duration::from_millis(TICK_MS).min(remaining)).await;
                continue;
            };
            let pass = crossing_time(&head);
            if !fits_in_window(now, window_end, pass) {
                println!(
                    "Vehicle {} {} held at {}: crossing would outlast the green window",
                    head.vehicle_type, head.id, self.road.id
                );
                sleep_until(window_end).await;
                return;
            }
            let Some(vehicle) = self.queue.try_pop() else {
                continue;
            };
            println!(
                "Vehicle {} {} crossing {} in {} ms",
                vehicle.vehicle_type,
                vehicle.id,
                self.road.id,
                pass.as_millis()
            );
            sleep(pass).await;
            self.sorter.dispatch(vehicle).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::sorter::ExitLog;
    use crate::model::topology::{road_between, NodeId};
    use crate::model::vehicle::VehicleType;
    use crate::network::sender::RoadSender;

    fn light_under_test(
        road: Road,
        queue: Arc<ConcurrentQueue<Vehicle>>,
        running: Arc<AtomicBool>,
    ) -> (TrafficLight, Arc<ExitLog>, SignalBoard) {
        let (hub, _rx) = EventHub::detached(road.id.to);
        let exits = Arc::new(ExitLog::new());
        let sorter = Arc::new(Sorter::new(
            road.id.to,
            Arc::clone(&hub),
            Arc::new(RoadSender::new()),
            Arc::clone(&exits),
        ));
        let signals: SignalBoard = Arc::new(Mutex::new(HashMap::new()));
        let light = TrafficLight::new(
            road,
            0,
            queue,
            Arc::new(RoundRobinArbiter::new(1)),
            sorter,
            hub,
            Arc::clone(&signals),
            running,
        );
        (light, exits, signals)
    }

    #[test]
    fn window_admission_is_exact() {
        // Uses a dedicated runtime only to obtain Instants; no sleeping.
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let now = Instant::now();
            let end = now + Duration::from_millis(900);
            assert!(fits_in_window(now, end, Duration::from_millis(900)));
            assert!(!fits_in_window(now, end, Duration::from_millis(901)));
        });
    }

    #[test]
    fn crossing_time_scales_with_vehicle_type() {
        let car = Vehicle::new("a".into(), VehicleType::Car, vec![NodeId::S]);
        let truck = Vehicle::new("b".into(), VehicleType::Truck, vec![NodeId::S]);
        assert_eq!(crossing_time(&car), Duration::from_millis(CROSSING_BASE_MS));
        assert_eq!(
            crossing_time(&truck),
            Duration::from_millis(3 * CROSSING_BASE_MS)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_vehicle_stays_queued_until_next_green() {
        // Road CR3->S has a 2000ms green window. Fill most of the window
        // with a car, then a truck (900ms) must be deferred to cycle two.
        let road = road_between(NodeId::Cr3, NodeId::S).unwrap();
        let queue = Arc::new(ConcurrentQueue::new());
        let running = Arc::new(AtomicBool::new(true));
        // Six cars occupy 1800ms of the 2000ms window; the trailing truck
        // (900ms) cannot fit and must wait for the next cycle.
        for i in 0..6 {
            queue.push(Vehicle::new(
                format!("E3-000{}", i),
                VehicleType::Car,
                vec![NodeId::E3, NodeId::Cr3, NodeId::S],
            ));
        }
        queue.push(Vehicle::new(
            "E3-0099".to_string(),
            VehicleType::Truck,
            vec![NodeId::E3, NodeId::Cr3, NodeId::S],
        ));

        let (light, exits, _signals) = light_under_test(road, Arc::clone(&queue), Arc::clone(&running));
        let handle = tokio::spawn(light.run());

        // End of the first green window: the truck is still queued.
        tokio::time::sleep(Duration::from_millis(1900)).await;
        assert_eq!(exits.completed(), 6);
        assert_eq!(queue.len(), 1);

        // The next cycle (arbiter N=1, so green again immediately) admits it.
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(exits.completed(), 7);

        running.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(3000)).await;
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn release_order_is_queue_order() {
        let road = road_between(NodeId::Cr3, NodeId::S).unwrap();
        let queue = Arc::new(ConcurrentQueue::new());
        let running = Arc::new(AtomicBool::new(true));
        queue.push(Vehicle::new(
            "E3-0001".to_string(),
            VehicleType::Bus,
            vec![NodeId::Cr3, NodeId::S],
        ));
        queue.push(Vehicle::new(
            "E3-0002".to_string(),
            VehicleType::Car,
            vec![NodeId::Cr3, NodeId::S],
        ));

        let (light, exits, signals) = light_under_test(road, queue, Arc::clone(&running));
        let handle = tokio::spawn(light.run());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let ids: Vec<String> = exits.records().iter().map(|r| r.vehicle_id.clone()).collect();
        assert_eq!(ids, vec!["E3-0001".to_string(), "E3-0002".to_string()]);
        assert_eq!(
            signals.lock().unwrap().get(&road.id),
            Some(&LightState::Green)
        );

        running.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(3000)).await;
        handle.abort();
    }
}
