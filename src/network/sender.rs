use crate::config::HOST;
use crate::model::topology::Road;
use crate::model::vehicle::Vehicle;
use crate::network::wire::{encode_line, WireMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Pushes vehicle-handoff messages to the next node's listener. One
/// connection per destination node is opened on first use and reused for
/// later sends. Each destination has its own connection lock, so a slow or
/// unreachable node never stalls sends toward the others; the outer map lock
/// is only held to look up the slot, never across connect or write. A failed
/// connect or write is logged and the vehicle is lost; there is no retry or
/// redelivery queue.
#[derive(Debug, Default)]
pub struct RoadSender {
    connections: std::sync::Mutex<HashMap<u16, Arc<Mutex<Option<TcpStream>>>>>,
}

impl RoadSender {
    pub fn new() -> Self {
        RoadSender {
            connections: std::sync::Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, port: u16) -> Arc<Mutex<Option<TcpStream>>> {
        let mut connections = self.connections.lock().unwrap();
        Arc::clone(
            connections
                .entry(port)
                .or_insert_with(|| Arc::new(Mutex::new(None))),
        )
    }

    /// Transmits `vehicle` onto `road`, addressed to the road's destination
    /// node. `ts` is the logical timestamp of the departure event.
    pub async fn send(&self, road: &Road, vehicle: &Vehicle, ts: u64) {
        let line = match encode_line(&WireMessage::from_vehicle(vehicle, road.id, ts)) {
            Ok(line) => line,
            Err(e) => {
                log::warn!("failed to serialize vehicle {} for {}: {}", vehicle.id, road.id, e);
                return;
            }
        };

        let port = road.id.to.port();
        let slot = self.slot(port);
        let mut conn = slot.lock().await;
        if conn.is_none() {
            match TcpStream::connect((HOST, port)).await {
                Ok(stream) => *conn = Some(stream),
                Err(e) => {
                    log::warn!(
                        "connect to {} failed, vehicle {} lost on {}: {}",
                        road.id.to,
                        vehicle.id,
                        road.id,
                        e
                    );
                    return;
                }
            }
        }
        let Some(stream) = conn.as_mut() else {
            return;
        };
        if let Err(e) = stream.write_all(line.as_bytes()).await {
            // Drop the pooled connection so the next send reconnects fresh.
            *conn = None;
            log::warn!(
                "send to {} failed, vehicle {} lost on {}: {}",
                road.id.to,
                vehicle.id,
                road.id,
                e
            );
        }
    }
}
