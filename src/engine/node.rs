use crate::config::HOST;
use crate::control::pass_road::PassRoad;
use crate::control::sorter::{ExitLog, Sorter};
use crate::control::spawner::VehicleSpawner;
use crate::control::traffic_light::{SignalBoard, TrafficLight};
use crate::model::topology::{inbound_roads, LightState, NodeId, NodeRole, RoadId};
use crate::monitoring::hub::EventHub;
use crate::network::receiver::{run_receiver, RoadQueueMap};
use crate::network::sender::RoadSender;
use crate::sync::arbiter::RoundRobinArbiter;
use crate::sync::queue::ConcurrentQueue;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Control surface of a running node process. This is the boundary consumed
/// by orchestration glue and the dashboard: start/stop plus a read-only
/// snapshot of per-road signal state and the exit journey records.
pub struct NodeHandle {
    pub node: NodeId,
    running: Arc<AtomicBool>,
    arbiter: Option<Arc<RoundRobinArbiter>>,
    signals: SignalBoard,
    exits: Arc<ExitLog>,
    workers: Vec<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
}

impl NodeHandle {
    /// Read-only copy of the current per-road signal states.
    pub fn signal_snapshot(&self) -> HashMap<RoadId, LightState> {
        self.signals.lock().unwrap().clone()
    }

    pub fn exit_log(&self) -> Arc<ExitLog> {
        Arc::clone(&self.exits)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Cooperative stop: workers observe the flag between iterations and
    /// turn-waiters are woken through the arbiter. Only the listener task is
    /// aborted, since a blocked accept never observes the flag; spawners and
    /// road workers finish whatever vehicle they are handling and exit on
    /// their own.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(arbiter) = &self.arbiter {
            arbiter.close();
        }
        if let Some(listener) = &self.listener {
            listener.abort();
        }
    }

    /// Waits for every worker task to drain and exit. Call after
    /// [`NodeHandle::shutdown`], otherwise this blocks until the node is
    /// stopped from elsewhere.
    pub async fn join(self) {
        for worker in self.workers {
            let _ = worker.await;
        }
        if let Some(listener) = self.listener {
            let _ = listener.await;
        }
    }
}

/// Builds and starts every worker of one node process. Binding the node's
/// listening port happens here so a bind failure is a startup error the
/// caller can turn into a fatal diagnostic.
pub async fn start_node(node: NodeId) -> io::Result<NodeHandle> {
    let running = Arc::new(AtomicBool::new(true));
    let hub = EventHub::start(node);
    let sender = Arc::new(RoadSender::new());
    let exits = Arc::new(ExitLog::new());
    let sorter = Arc::new(Sorter::new(
        node,
        Arc::clone(&hub),
        Arc::clone(&sender),
        Arc::clone(&exits),
    ));
    let signals: SignalBoard = Arc::new(Mutex::new(HashMap::new()));
    let mut workers: Vec<JoinHandle<()>> = Vec::new();
    let mut listener_task = None;
    let mut arbiter = None;

    match node.role() {
        NodeRole::Entrance => {
            let spawner = VehicleSpawner::new(
                node,
                Arc::clone(&hub),
                Arc::clone(&sender),
                Arc::clone(&running),
            );
            workers.push(tokio::spawn(spawner.run()));
        }
        NodeRole::Crossroad | NodeRole::Exit => {
            let inbound = inbound_roads(node);
            let shared_arbiter = Arc::new(RoundRobinArbiter::new(inbound.len()));
            arbiter = Some(Arc::clone(&shared_arbiter));

            let mut arrival_queues: HashMap<RoadId, Arc<ConcurrentQueue<_>>> = HashMap::new();
            for (slot, road) in inbound.iter().enumerate() {
                let arrivals = Arc::new(ConcurrentQueue::new());
                let signal_queue = Arc::new(ConcurrentQueue::new());
                arrival_queues.insert(road.id, Arc::clone(&arrivals));
                signals.lock().unwrap().insert(road.id, LightState::Red);

                let pass_road = PassRoad::new(
                    *road,
                    arrivals,
                    Arc::clone(&signal_queue),
                    Arc::clone(&hub),
                    Arc::clone(&running),
                );
                workers.push(tokio::spawn(pass_road.run()));

                let light = TrafficLight::new(
                    *road,
                    slot,
                    signal_queue,
                    Arc::clone(&shared_arbiter),
                    Arc::clone(&sorter),
                    Arc::clone(&hub),
                    Arc::clone(&signals),
                    Arc::clone(&running),
                );
                workers.push(tokio::spawn(light.run()));
            }

            let default_road = inbound[0].id;
            let default_queue = Arc::clone(&arrival_queues[&default_road]);
            let queue_map = Arc::new(RoadQueueMap::new(arrival_queues, default_queue));
            let listener = TcpListener::bind((HOST, node.port())).await?;
            println!("{} listening on port {}", node, node.port());
            listener_task = Some(tokio::spawn(run_receiver(
                node,
                listener,
                queue_map,
                default_road,
                Arc::clone(&hub),
            )));
        }
    }

    Ok(NodeHandle {
        node,
        running,
        arbiter,
        signals,
        exits,
        workers,
        listener: listener_task,
    })
}
