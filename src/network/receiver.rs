use crate::model::topology::{NodeId, RoadId};
use crate::model::vehicle::Vehicle;
use crate::monitoring::hub::EventHub;
use crate::network::wire::WireMessage;
use crate::sync::queue::ConcurrentQueue;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Maps an inbound message's declared origin road to the PassRoad arrival
/// queue that simulates that road, with a default queue for messages that
/// carry no road or an unknown one.
pub struct RoadQueueMap {
    queues: HashMap<RoadId, Arc<ConcurrentQueue<Vehicle>>>,
    default_queue: Arc<ConcurrentQueue<Vehicle>>,
}

impl RoadQueueMap {
    pub fn new(
        queues: HashMap<RoadId, Arc<ConcurrentQueue<Vehicle>>>,
        default_queue: Arc<ConcurrentQueue<Vehicle>>,
    ) -> Self {
        RoadQueueMap {
            queues,
            default_queue,
        }
    }

    /// Selects the arrival queue for a declared origin road, falling back to
    /// the default queue when unmatched. Returns the road actually used.
    fn select(&self, declared: Option<RoadId>) -> (&Arc<ConcurrentQueue<Vehicle>>, Option<RoadId>) {
        if let Some(road) = declared {
            if let Some(queue) = self.queues.get(&road) {
                return (queue, Some(road));
            }
            log::warn!("no queue for declared road {}, using default", road);
        }
        (&self.default_queue, None)
    }
}

/// Accept loop of a node's single inbound listener. Each accepted connection
/// is handled on its own task so simultaneous inbound transfers do not block
/// each other.
pub async fn run_receiver(
    node: NodeId,
    listener: TcpListener,
    queues: Arc<RoadQueueMap>,
    default_road: RoadId,
    hub: Arc<EventHub>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                log::debug!("{}: inbound connection from {}", node, peer);
                let queues = Arc::clone(&queues);
                let hub = Arc::clone(&hub);
                tokio::spawn(async move {
                    handle_connection(node, stream, queues, default_road, hub).await;
                });
            }
            Err(e) => {
                log::warn!("{}: accept failed: {}", node, e);
            }
        }
    }
}

/// Reads newline-delimited wire messages until the peer closes. Lines that
/// fail to parse are logged and skipped; the connection keeps serving.
async fn handle_connection(
    node: NodeId,
    stream: TcpStream,
    queues: Arc<RoadQueueMap>,
    default_road: RoadId,
    hub: Arc<EventHub>,
) {
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                let message: WireMessage = match serde_json::from_str(&line) {
                    Ok(message) => message,
                    Err(e) => {
                        log::warn!("{}: skipping malformed message: {}", node, e);
                        continue;
                    }
                };
                hub.clock().update(message.ts);
                let (vehicle, declared) = message.into_vehicle(node);
                let (queue, matched) = queues.select(declared);
                let road = matched.unwrap_or(default_road);
                println!(
                    "Vehicle {} {} entering road {} at {}",
                    vehicle.vehicle_type, vehicle.id, road, node
                );
                hub.vehicle_road_arrival(road, &vehicle);
                queue.push(vehicle);
            }
            Ok(None) => break,
            Err(e) => {
                log::warn!("{}: connection read error: {}", node, e);
                break;
            }
        }
    }
}
