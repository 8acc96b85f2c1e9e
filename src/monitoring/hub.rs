use crate::config::{HOST, MONITOR_PORT};
use crate::model::event::Event;
use crate::model::topology::{LightState, NodeId, RoadId};
use crate::model::vehicle::Vehicle;
use crate::sync::clock::LogicalClock;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// Node-side event publishing. Every causally relevant local event is
/// stamped with the node's logical clock here and forwarded to the monitor
/// over a dedicated connection by a background task. When the monitor is not
/// reachable the stream is discarded; the simulation itself never blocks on
/// observation.
pub struct EventHub {
    node: NodeId,
    clock: Arc<LogicalClock>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHub {
    /// Creates the hub for a node and spawns its forwarding task.
    pub fn start(node: NodeId) -> Arc<EventHub> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(forward_events(node, rx));
        Arc::new(EventHub {
            node,
            clock: Arc::new(LogicalClock::new()),
            tx,
        })
    }

    /// Hub variant without a forwarding task, for unit tests that only need
    /// clock stamping. Returns the receiving end of the event stream.
    pub fn detached(node: NodeId) -> (Arc<EventHub>, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Arc::new(EventHub {
            node,
            clock: Arc::new(LogicalClock::new()),
            tx,
        });
        (hub, rx)
    }

    pub fn clock(&self) -> &LogicalClock {
        &self.clock
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    fn publish(&self, event: Event) {
        // The receiver only disappears during shutdown; losing the tail of
        // the stream then is fine.
        let _ = self.tx.send(event);
    }

    pub fn new_vehicle(&self, vehicle: &Vehicle) -> u64 {
        let ts = self.clock.tick();
        self.publish(Event::NewVehicle {
            node: self.node,
            ts,
            vehicle: vehicle.clone(),
        });
        ts
    }

    pub fn vehicle_departure(&self, road: RoadId, vehicle: &Vehicle) -> u64 {
        let ts = self.clock.tick();
        self.publish(Event::VehicleDeparture {
            node: self.node,
            ts,
            road,
            vehicle: vehicle.clone(),
        });
        ts
    }

    pub fn vehicle_road_arrival(&self, road: RoadId, vehicle: &Vehicle) -> u64 {
        let ts = self.clock.tick();
        self.publish(Event::VehicleRoadArrival {
            node: self.node,
            ts,
            road,
            vehicle: vehicle.clone(),
        });
        ts
    }

    pub fn vehicle_signal_arrival(&self, road: RoadId, vehicle: &Vehicle) -> u64 {
        let ts = self.clock.tick();
        self.publish(Event::VehicleSignalArrival {
            node: self.node,
            ts,
            road,
            vehicle: vehicle.clone(),
        });
        ts
    }

    pub fn vehicle_exit(&self, vehicle: &Vehicle) -> u64 {
        let ts = self.clock.tick();
        self.publish(Event::VehicleExit {
            node: self.node,
            ts,
            vehicle: vehicle.clone(),
        });
        ts
    }

    pub fn signal_change(&self, road: RoadId, state: LightState) -> u64 {
        let ts = self.clock.tick();
        self.publish(Event::SignalChange {
            node: self.node,
            ts,
            road,
            state,
        });
        ts
    }
}

/// Drains the hub channel into the monitor connection. The connection is
/// opened lazily and re-opened on the next event after a failure, so a node
/// started before the monitor picks it up as soon as it appears. While the
/// monitor is absent the events are consumed and dropped so the channel
/// never grows unbounded.
async fn forward_events(node: NodeId, mut rx: mpsc::UnboundedReceiver<Event>) {
    let mut stream: Option<TcpStream> = None;
    let mut reported_down = false;
    while let Some(event) = rx.recv().await {
        if stream.is_none() {
            match TcpStream::connect((HOST, MONITOR_PORT)).await {
                Ok(conn) => {
                    stream = Some(conn);
                    reported_down = false;
                }
                Err(e) => {
                    if !reported_down {
                        log::warn!("{}: monitor unreachable, events discarded: {}", node, e);
                        reported_down = true;
                    }
                    continue;
                }
            }
        }
        let mut line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                log::warn!("{}: failed to serialize event: {}", node, e);
                continue;
            }
        };
        line.push('\n');
        let Some(conn) = stream.as_mut() else {
            continue;
        };
        if let Err(e) = conn.write_all(line.as_bytes()).await {
            log::warn!("{}: monitor connection lost: {}", node, e);
            stream = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vehicle::VehicleType;

    #[tokio::test]
    async fn events_carry_strictly_increasing_timestamps() {
        let (hub, mut rx) = EventHub::detached(NodeId::Cr3);
        let vehicle = Vehicle::new(
            "E3-0001".to_string(),
            VehicleType::Car,
            vec![NodeId::E3, NodeId::Cr3, NodeId::S],
        );
        let road = RoadId {
            from: NodeId::E3,
            to: NodeId::Cr3,
        };
        hub.vehicle_road_arrival(road, &vehicle);
        hub.vehicle_signal_arrival(road, &vehicle);
        hub.signal_change(road, LightState::Red);

        let mut last = 0;
        for _ in 0..3 {
            let event = rx.recv().await.unwrap();
            assert!(event.timestamp() > last);
            assert_eq!(event.node(), NodeId::Cr3);
            last = event.timestamp();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn forwarder_reaches_a_monitor_started_after_the_node() {
        use std::time::Duration;
        use tokio::io::{AsyncBufReadExt, BufReader};
        use tokio::net::TcpListener;

        let hub = EventHub::start(NodeId::E1);
        let vehicle = Vehicle::new(
            "E1-7777".to_string(),
            VehicleType::Car,
            vec![NodeId::E1, NodeId::Cr1, NodeId::Cr3, NodeId::S],
        );
        // No monitor is listening yet: this event is consumed and dropped.
        hub.new_vehicle(&vehicle);
        tokio::time::sleep(Duration::from_millis(100)).await;

        // The monitor comes up afterwards. Other nodes in this test binary
        // may connect too, so collect lines from every connection.
        let listener = TcpListener::bind((HOST, MONITOR_PORT)).await.unwrap();
        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                let line_tx = line_tx.clone();
                tokio::spawn(async move {
                    let mut lines = BufReader::new(socket).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        let _ = line_tx.send(line);
                    }
                });
            }
        });

        // The next event triggers a fresh connect and must land.
        hub.new_vehicle(&vehicle);
        let found = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(line) = line_rx.recv().await {
                if line.contains("E1-7777") {
                    return true;
                }
            }
            false
        })
        .await
        .unwrap();
        assert!(found);
    }
}
