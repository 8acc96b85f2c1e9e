// node_main.rs
use roadnet_rts::engine::node::start_node;
use roadnet_rts::model::topology::NodeId;
use std::env;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::init();

    let token = match env::args().nth(1) {
        Some(token) => token,
        None => {
            eprintln!("Usage: node_main <NODE>  (one of E1 E2 E3 CR1 CR2 CR3 S)");
            process::exit(1);
        }
    };
    let node: NodeId = match token.parse() {
        Ok(node) => node,
        Err(e) => {
            eprintln!("{}. Valid tokens: E1 E2 E3 CR1 CR2 CR3 S", e);
            process::exit(1);
        }
    };

    let handle = match start_node(node).await {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to start node {}: {}", node, e);
            process::exit(1);
        }
    };
    println!("Node {} running. Press Ctrl-C to stop.", node);

    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("ctrl-c handler failed: {}", e);
    }
    println!("Stopping node {}...", node);
    handle.shutdown();
    // Workers finish the vehicle they are handling before exiting.
    handle.join().await;
    println!("Node {} stopped.", node);
}
