// monitor_main.rs
use roadnet_rts::config::{HOST, MONITOR_PORT};
use roadnet_rts::monitoring::aggregator::{run_collector, EventAggregator};
use roadnet_rts::monitoring::event_log;
use std::process;
use std::sync::Arc;
use tokio::net::TcpListener;

const EVENT_LOG_FILE: &str = "events.csv";

#[tokio::main]
async fn main() {
    env_logger::init();

    let listener = match TcpListener::bind((HOST, MONITOR_PORT)).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind monitor port {}: {}", MONITOR_PORT, e);
            process::exit(1);
        }
    };
    println!("Monitor listening on port {}", MONITOR_PORT);

    let aggregator = Arc::new(EventAggregator::new());
    tokio::spawn(run_collector(listener, Arc::clone(&aggregator)));

    // Single consumer draining the ordered stream: print and persist.
    loop {
        let event = aggregator.next_event().await;
        match event.vehicle() {
            Some(vehicle) => println!(
                "[{:>6}] {} {} vehicle {} {}",
                event.timestamp(),
                event.node(),
                event.kind(),
                vehicle.vehicle_type,
                vehicle.id
            ),
            None => println!(
                "[{:>6}] {} {} {}",
                event.timestamp(),
                event.node(),
                event.kind(),
                event
                    .road()
                    .map(|r| r.to_string())
                    .unwrap_or_default()
            ),
        }
        event_log::log_event(EVENT_LOG_FILE, &event);
    }
}
