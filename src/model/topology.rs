use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies a node in the road graph. The set is static: three entrances,
/// three crossroads and one exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    E1,
    E2,
    E3,
    #[serde(rename = "CR1")]
    Cr1,
    #[serde(rename = "CR2")]
    Cr2,
    #[serde(rename = "CR3")]
    Cr3,
    S,
}

/// Functional role of a node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Vehicles enter the simulation here.
    Entrance,
    /// Controlled junction with per-road traffic lights.
    Crossroad,
    /// Vehicles leave the simulation here.
    Exit,
}

/// The two states of a per-road traffic light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightState {
    Green,
    Red,
}

impl NodeId {
    /// Every node in the graph, in a stable order.
    pub fn all() -> [NodeId; 7] {
        [
            NodeId::E1,
            NodeId::E2,
            NodeId::E3,
            NodeId::Cr1,
            NodeId::Cr2,
            NodeId::Cr3,
            NodeId::S,
        ]
    }

    pub fn role(self) -> NodeRole {
        match self {
            NodeId::E1 | NodeId::E2 | NodeId::E3 => NodeRole::Entrance,
            NodeId::Cr1 | NodeId::Cr2 | NodeId::Cr3 => NodeRole::Crossroad,
            NodeId::S => NodeRole::Exit,
        }
    }

    /// Fixed TCP port of this node's inbound listener. Statically assigned;
    /// a collision between running processes is a configuration error.
    pub fn port(self) -> u16 {
        match self {
            NodeId::E1 => 9101,
            NodeId::E2 => 9102,
            NodeId::E3 => 9103,
            NodeId::Cr1 => 9201,
            NodeId::Cr2 => 9202,
            NodeId::Cr3 => 9203,
            NodeId::S => 9301,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let token = match self {
            NodeId::E1 => "E1",
            NodeId::E2 => "E2",
            NodeId::E3 => "E3",
            NodeId::Cr1 => "CR1",
            NodeId::Cr2 => "CR2",
            NodeId::Cr3 => "CR3",
            NodeId::S => "S",
        };
        write!(f, "{}", token)
    }
}

impl FromStr for NodeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "E1" => Ok(NodeId::E1),
            "E2" => Ok(NodeId::E2),
            "E3" => Ok(NodeId::E3),
            "CR1" => Ok(NodeId::Cr1),
            "CR2" => Ok(NodeId::Cr2),
            "CR3" => Ok(NodeId::Cr3),
            "S" => Ok(NodeId::S),
            other => Err(format!("unknown node token '{}'", other)),
        }
    }
}

/// Identity of a directed road: the ordered (origin, destination) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoadId {
    pub from: NodeId,
    pub to: NodeId,
}

impl fmt::Display for RoadId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// A directed, timed edge of the road graph.
#[derive(Debug, Clone, Copy)]
pub struct Road {
    pub id: RoadId,
    /// Base traversal time of the segment in milliseconds (factor-1 vehicle).
    pub travel_ms: u64,
    /// Green-phase duration of this road's traffic light in milliseconds.
    pub green_ms: u64,
}

impl Road {
    fn new(from: NodeId, to: NodeId, travel_ms: u64, green_ms: u64) -> Self {
        Road {
            id: RoadId { from, to },
            travel_ms,
            green_ms,
        }
    }
}

/// The authoritative road table. Loaded once per process; there is at most
/// one road per ordered (origin, destination) pair.
pub fn roads() -> Vec<Road> {
    vec![
        Road::new(NodeId::E1, NodeId::Cr1, 3000, 2000),
        Road::new(NodeId::E2, NodeId::Cr2, 2500, 2000),
        Road::new(NodeId::E3, NodeId::Cr2, 2200, 2000),
        Road::new(NodeId::E3, NodeId::Cr3, 2000, 2500),
        Road::new(NodeId::Cr1, NodeId::Cr3, 3500, 2500),
        Road::new(NodeId::Cr2, NodeId::Cr3, 3000, 2500),
        Road::new(NodeId::Cr3, NodeId::S, 2000, 2000),
    ]
}

/// Looks up the road connecting two nodes, if one exists.
pub fn road_between(from: NodeId, to: NodeId) -> Option<Road> {
    roads()
        .into_iter()
        .find(|road| road.id.from == from && road.id.to == to)
}

/// Roads whose destination is the given node, in table order. The position
/// of a road in this list is its arbiter slot at the node.
pub fn inbound_roads(node: NodeId) -> Vec<Road> {
    roads()
        .into_iter()
        .filter(|road| road.id.to == node)
        .collect()
}

/// Every valid path starting at the given entrance.
pub fn entrance_paths(entrance: NodeId) -> Vec<Vec<NodeId>> {
    match entrance {
        NodeId::E1 => vec![vec![NodeId::E1, NodeId::Cr1, NodeId::Cr3, NodeId::S]],
        NodeId::E2 => vec![vec![NodeId::E2, NodeId::Cr2, NodeId::Cr3, NodeId::S]],
        NodeId::E3 => vec![
            vec![NodeId::E3, NodeId::Cr3, NodeId::S],
            vec![NodeId::E3, NodeId::Cr2, NodeId::Cr3, NodeId::S],
        ],
        _ => Vec::new(),
    }
}

/// Fallback path for inbound messages that arrive without one: the shortest
/// continuation from the given node to the exit.
pub fn default_path_from(node: NodeId) -> Vec<NodeId> {
    match node {
        NodeId::E1 => vec![NodeId::E1, NodeId::Cr1, NodeId::Cr3, NodeId::S],
        NodeId::E2 => vec![NodeId::E2, NodeId::Cr2, NodeId::Cr3, NodeId::S],
        NodeId::E3 => vec![NodeId::E3, NodeId::Cr3, NodeId::S],
        NodeId::Cr1 => vec![NodeId::Cr1, NodeId::Cr3, NodeId::S],
        NodeId::Cr2 => vec![NodeId::Cr2, NodeId::Cr3, NodeId::S],
        NodeId::Cr3 => vec![NodeId::Cr3, NodeId::S],
        NodeId::S => vec![NodeId::S],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ports_are_unique() {
        let mut ports: Vec<u16> = NodeId::all().iter().map(|n| n.port()).collect();
        ports.sort_unstable();
        ports.dedup();
        assert_eq!(ports.len(), NodeId::all().len());
    }

    #[test]
    fn road_table_has_no_duplicate_pairs() {
        let all = roads();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.id, b.id, "duplicate road {}", a.id);
            }
        }
    }

    #[test]
    fn entrance_paths_are_connected_and_terminate_at_exit() {
        for entrance in [NodeId::E1, NodeId::E2, NodeId::E3] {
            let paths = entrance_paths(entrance);
            assert!(!paths.is_empty());
            for path in paths {
                assert_eq!(path[0], entrance);
                assert_eq!(*path.last().unwrap(), NodeId::S);
                for pair in path.windows(2) {
                    assert!(
                        road_between(pair[0], pair[1]).is_some(),
                        "no road {} -> {}",
                        pair[0],
                        pair[1]
                    );
                }
            }
        }
    }

    #[test]
    fn default_paths_are_connected() {
        for node in NodeId::all() {
            let path = default_path_from(node);
            assert_eq!(path[0], node);
            assert_eq!(*path.last().unwrap(), NodeId::S);
            for pair in path.windows(2) {
                assert!(road_between(pair[0], pair[1]).is_some());
            }
        }
    }

    #[test]
    fn cr3_is_fed_by_three_roads() {
        let inbound = inbound_roads(NodeId::Cr3);
        assert_eq!(inbound.len(), 3);
        assert!(inbound.iter().all(|r| r.id.to == NodeId::Cr3));
    }

    #[test]
    fn node_tokens_round_trip() {
        for node in NodeId::all() {
            let parsed: NodeId = node.to_string().parse().unwrap();
            assert_eq!(parsed, node);
        }
        assert!("CR9".parse::<NodeId>().is_err());
    }
}
