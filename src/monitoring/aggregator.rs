use crate::model::event::Event;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::Notify;

/// An accepted event plus its arrival sequence number. The sequence breaks
/// logical-timestamp ties between nodes so the heap order is total.
#[derive(Debug)]
struct Sequenced {
    ts: u64,
    seq: u64,
    event: Event,
}

impl PartialEq for Sequenced {
    fn eq(&self, other: &Self) -> bool {
        self.ts == other.ts && self.seq == other.seq
    }
}

impl Eq for Sequenced {}

impl PartialOrd for Sequenced {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Sequenced {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.ts, self.seq).cmp(&(other.ts, other.seq))
    }
}

/// Central collector ordering events from all node processes by logical
/// timestamp. Accepted events are never dropped; with no consumer draining
/// they accumulate unbounded, which is acceptable for a bounded-duration
/// simulation run. At most one consumer is expected.
#[derive(Debug, Default)]
pub struct EventAggregator {
    heap: Mutex<BinaryHeap<Reverse<Sequenced>>>,
    seq: AtomicU64,
    notify: Notify,
}

impl EventAggregator {
    pub fn new() -> Self {
        EventAggregator {
            heap: Mutex::new(BinaryHeap::new()),
            seq: AtomicU64::new(0),
            notify: Notify::new(),
        }
    }

    /// Inserts an event into the ordered structure.
    pub fn add_event(&self, event: Event) {
        let entry = Sequenced {
            ts: event.timestamp(),
            seq: self.seq.fetch_add(1, AtomicOrdering::SeqCst),
            event,
        };
        self.heap.lock().unwrap().push(Reverse(entry));
        self.notify.notify_one();
    }

    /// Removes the earliest pending event without blocking.
    pub fn try_next(&self) -> Option<Event> {
        self.heap.lock().unwrap().pop().map(|Reverse(s)| s.event)
    }

    /// Blocking take of the earliest pending event.
    pub async fn next_event(&self) -> Event {
        loop {
            let notified = self.notify.notified();
            if let Some(event) = self.try_next() {
                return event;
            }
            notified.await;
        }
    }

    /// Empties every pending event in logical-time order.
    pub fn drain_all(&self) -> Vec<Event> {
        let mut heap = self.heap.lock().unwrap();
        let mut drained = Vec::with_capacity(heap.len());
        while let Some(Reverse(s)) = heap.pop() {
            drained.push(s.event);
        }
        drained
    }

    pub fn pending(&self) -> usize {
        self.heap.lock().unwrap().len()
    }
}

/// Accept loop of the monitor's collector endpoint. Each node connection is
/// served on its own task; malformed lines are logged and skipped.
pub async fn run_collector(listener: TcpListener, aggregator: std::sync::Arc<EventAggregator>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                log::debug!("monitor: node connected from {}", peer);
                let aggregator = std::sync::Arc::clone(&aggregator);
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stream).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<Event>(&line) {
                            Ok(event) => aggregator.add_event(event),
                            Err(e) => log::warn!("monitor: skipping malformed event: {}", e),
                        }
                    }
                });
            }
            Err(e) => {
                log::warn!("monitor: accept failed: {}", e);
            }
        }
    }
}
