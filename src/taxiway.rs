//! Static taxiway graph and shortest-path router.

use ordered_float::OrderedFloat;
use pathfinding::prelude::dijkstra;
use serde::{ Deserialize, Serialize };
use std::collections::{ HashMap, HashSet };
use tracing::{ trace, warn };

use crate::geo;
use crate::phonetic;
use crate::types::{ Position, TaxiWaypoint };

/// Cost multiplier for edges leaving the commanded taxiways
pub const NON_PREFERRED_PENALTY: f64 = 5.0;

/// Graph node as supplied by the airport loader
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NodeRecord {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
}

/// Undirected edge along one taxiway
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EdgeRecord {
    pub from: String,
    pub to: String,
    pub taxiway: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxiNode {
    pub id: String,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub neighbor: usize,
    pub distance_ft: f64,
}

/// Node map, adjacency list and node to taxiway index
#[derive(Debug, Clone, Default)]
pub struct TaxiwayGraph {
    nodes: Vec<TaxiNode>,
    index: HashMap<String, usize>,
    adjacency: Vec<Vec<Edge>>,
    node_taxiways: Vec<HashSet<String>>,
}

impl TaxiwayGraph {
    /// Build the graph; edges naming unknown nodes are dropped with a warning
    pub fn new(nodes: &[NodeRecord], edges: &[EdgeRecord]) -> Self {
        let mut graph = Self::default();
        for record in nodes {
            if graph.index.contains_key(&record.id) {
                warn!("duplicate taxiway node {}", record.id);
                continue;
            }
            graph.index.insert(record.id.clone(), graph.nodes.len());
            graph.nodes.push(TaxiNode {
                id: record.id.clone(),
                position: Position::new(record.lat, record.lon),
            });
            graph.adjacency.push(Vec::new());
            graph.node_taxiways.push(HashSet::new());
        }

        for edge in edges {
            let (Some(&a), Some(&b)) = (graph.index.get(&edge.from), graph.index.get(&edge.to)) else {
                warn!("taxiway edge {} -> {} references an unknown node", edge.from, edge.to);
                continue;
            };
            let distance_ft = geo::distance_ft(graph.nodes[a].position, graph.nodes[b].position);
            graph.adjacency[a].push(Edge { neighbor: b, distance_ft });
            graph.adjacency[b].push(Edge { neighbor: a, distance_ft });

            let taxiway = edge.taxiway.to_ascii_uppercase();
            graph.node_taxiways[a].insert(taxiway.clone());
            graph.node_taxiways[b].insert(taxiway);
        }
        graph
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> Option<&TaxiNode> {
        self.nodes.get(index)
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn neighbors(&self, index: usize) -> &[Edge] {
        self.adjacency.get(index).map_or(&[][..], Vec::as_slice)
    }

    pub fn taxiways_at(&self, index: usize) -> Option<&HashSet<String>> {
        self.node_taxiways.get(index)
    }
}

/// Result of a routing request
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub waypoints: Vec<TaxiWaypoint>,

    /// No connected path existed and the route is a direct segment
    pub degraded: bool,
}

pub struct Router {
    graph: TaxiwayGraph,
}

impl Router {
    pub fn new(graph: TaxiwayGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &TaxiwayGraph {
        &self.graph
    }

    /// Canonical taxiway identifiers from spoken or written route tokens
    pub fn parse_route_tokens<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
        tokens
            .iter()
            .map(|token| token.as_ref().trim_matches(',').to_ascii_uppercase())
            .filter(|token| !token.is_empty() && token != "VIA" && token != "AND" && token != "THEN")
            .map(|token| match phonetic::letter_for_word(&token) {
                Some(letter) => letter.to_string(),
                None => token,
            })
            .collect()
    }

    /// Closest node to `position` by linear scan
    pub fn nearest_node(&self, position: Position) -> Option<usize> {
        self.graph
            .nodes
            .iter()
            .enumerate()
            .min_by_key(|(_, node)| OrderedFloat(geo::distance_ft(position, node.position)))
            .map(|(index, _)| index)
    }

    pub fn has_taxiway(&self, taxiway: &str) -> bool {
        let taxiway = taxiway.to_ascii_uppercase();
        self.graph.node_taxiways.iter().any(|set| set.contains(&taxiway))
    }

    /// Indices of every node lying on `taxiway`
    pub fn taxiway_nodes(&self, taxiway: &str) -> Vec<usize> {
        let taxiway = taxiway.to_ascii_uppercase();
        (0..self.graph.len())
            .filter(|&i| self.graph.node_taxiways[i].contains(&taxiway))
            .collect()
    }

    /// Route between two arbitrary positions, snapping both ends to the graph
    ///
    /// Returns `None` only when the graph has no nodes.
    pub fn build_route(&self, from: Position, to: Position, preferred: &[String]) -> Option<Route> {
        let start = self.nearest_node(from)?;
        let goal = self.nearest_node(to)?;
        Some(self.route_between(start, goal, preferred))
    }

    /// Dijkstra between two node indices, strongly favouring `preferred` taxiways
    pub fn route_between(&self, start: usize, goal: usize, preferred: &[String]) -> Route {
        if start == goal {
            return Route { waypoints: vec![self.waypoint(start)], degraded: false };
        }

        let preferred: HashSet<String> = preferred.iter().map(|t| t.to_ascii_uppercase()).collect();
        let found = dijkstra(
            &start,
            |&node| {
                self.graph.adjacency[node].iter().map(|edge| {
                    let weight = if preferred.is_empty()
                        || self.graph.node_taxiways[edge.neighbor].iter().any(|t| preferred.contains(t))
                    {
                        edge.distance_ft
                    } else {
                        edge.distance_ft * NON_PREFERRED_PENALTY
                    };
                    (edge.neighbor, OrderedFloat(weight))
                })
            },
            |&node| node == goal,
        );

        match found {
            Some((path, cost)) => {
                trace!("taxi route {} -> {} with cost {:.0}", self.graph.nodes[start].id, self.graph.nodes[goal].id, cost.0);
                Route {
                    waypoints: path.into_iter().map(|node| self.waypoint(node)).collect(),
                    degraded: false,
                }
            }
            None => {
                warn!(
                    "no taxi path from {} to {}, using a direct segment",
                    self.graph.nodes[start].id,
                    self.graph.nodes[goal].id
                );
                Route {
                    waypoints: vec![self.waypoint(start), self.waypoint(goal)],
                    degraded: true,
                }
            }
        }
    }

    /// Total true distance of a waypoint sequence in feet
    pub fn route_length_ft(waypoints: &[TaxiWaypoint]) -> f64 {
        waypoints
            .windows(2)
            .map(|pair| geo::distance_ft(pair[0].position, pair[1].position))
            .sum()
    }

    /// Waypoint at graph node `index`, which must come from this router's graph
    pub fn waypoint(&self, index: usize) -> TaxiWaypoint {
        let node = &self.graph.nodes[index];
        TaxiWaypoint::new(node.position, node.id.clone())
    }
}
