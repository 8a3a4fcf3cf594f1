//! Carrier networks between nodes.
//!
//! A network is described by a 0/1 connection matrix over an ordered node
//! list. Entry `(i, j) = 1` allows flow from node `i` to node `j`. Diagonal
//! entries carry no meaning and are ignored (validation warns about them).

use crate::diagnostics::Diagnostics;
use petgraph::algo::connected_components;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Square 0/1 connection matrix over `nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionMatrix {
    pub nodes: Vec<String>,
    pub matrix: Vec<Vec<u8>>,
}

impl ConnectionMatrix {
    /// Build a matrix from a list of directed arcs.
    pub fn from_arcs(nodes: Vec<String>, arcs: &[(&str, &str)]) -> Self {
        let n = nodes.len();
        let mut matrix = vec![vec![0u8; n]; n];
        for (from, to) in arcs {
            let i = nodes.iter().position(|x| x == from);
            let j = nodes.iter().position(|x| x == to);
            if let (Some(i), Some(j)) = (i, j) {
                matrix[i][j] = 1;
            }
        }
        Self { nodes, matrix }
    }

    /// Ordered `(from, to)` pairs with a connection, diagonal excluded.
    pub fn connected_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = Vec::new();
        for (i, row) in self.matrix.iter().enumerate() {
            for (j, &cell) in row.iter().enumerate() {
                if i != j && cell != 0 {
                    pairs.push((self.nodes[i].as_str(), self.nodes[j].as_str()));
                }
            }
        }
        pairs
    }
}

/// One named network of a carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkData {
    pub connection: ConnectionMatrix,
    /// Upper bound on every arc flow (MW)
    pub capacity: f64,
    /// Fraction of the flow lost in transit
    #[serde(default)]
    pub loss: f64,
}

impl NetworkData {
    pub fn new(connection: ConnectionMatrix, capacity: f64) -> Self {
        Self {
            connection,
            capacity,
            loss: 0.0,
        }
    }

    pub fn validate_into(&self, node_set: &[String], entity: &str, diag: &mut Diagnostics) {
        let conn = &self.connection;
        let n = conn.nodes.len();

        let mut seen = HashSet::new();
        for node in &conn.nodes {
            if !node_set.contains(node) {
                diag.add_error_with_entity(
                    "network",
                    &format!("node '{node}' does not exist in the set of nodes"),
                    entity,
                );
            }
            if !seen.insert(node.as_str()) {
                diag.add_error_with_entity(
                    "network",
                    &format!("node '{node}' appears twice in the connection matrix"),
                    entity,
                );
            }
        }

        if conn.matrix.len() != n || conn.matrix.iter().any(|row| row.len() != n) {
            diag.add_error_with_entity(
                "network",
                &format!("connection matrix must be {n}x{n}"),
                entity,
            );
            return;
        }

        for (i, row) in conn.matrix.iter().enumerate() {
            for (j, &cell) in row.iter().enumerate() {
                if cell > 1 {
                    diag.add_error_with_entity(
                        "network",
                        &format!("connection entry ({i}, {j}) must be 0 or 1, got {cell}"),
                        entity,
                    );
                } else if i == j && cell == 1 {
                    diag.add_warning_with_entity(
                        "network",
                        &format!("diagonal entry for node '{}' is ignored", conn.nodes[i]),
                        entity,
                    );
                }
            }
        }

        if !(self.capacity.is_finite() && self.capacity >= 0.0) {
            diag.add_error_with_entity(
                "network",
                &format!("capacity must be finite and non-negative, got {}", self.capacity),
                entity,
            );
        }
        if !(0.0..1.0).contains(&self.loss) {
            diag.add_error_with_entity(
                "network",
                &format!("loss must lie in [0, 1), got {}", self.loss),
                entity,
            );
        }
    }

    /// Directed graph of the network; edge weights are the arc capacity.
    pub fn graph(&self) -> DiGraph<String, f64> {
        let mut graph = DiGraph::new();
        let mut index: BTreeMap<&str, NodeIndex> = BTreeMap::new();
        for node in &self.connection.nodes {
            index.insert(node.as_str(), graph.add_node(node.clone()));
        }
        for (from, to) in self.connection.connected_pairs() {
            graph.add_edge(index[from], index[to], self.capacity);
        }
        graph
    }

    pub fn stats(&self) -> NetworkStats {
        let graph = self.graph();
        let node_count = graph.node_count();
        let arc_count = graph.edge_count();
        let degrees: Vec<usize> = graph
            .node_indices()
            .map(|n| graph.neighbors_undirected(n).count())
            .collect();
        let max_degree = degrees.iter().copied().max().unwrap_or(0);
        let density = if node_count < 2 {
            0.0
        } else {
            arc_count as f64 / (node_count as f64 * (node_count as f64 - 1.0))
        };

        NetworkStats {
            node_count,
            arc_count,
            components: connected_components(&graph),
            max_degree,
            density,
            isolated: isolated_nodes(&graph),
        }
    }
}

fn isolated_nodes(graph: &DiGraph<String, f64>) -> Vec<String> {
    graph
        .node_indices()
        .filter(|&n| graph.neighbors_undirected(n).next().is_none())
        .map(|n| graph[n].clone())
        .collect()
}

/// Structure summary of one network, reported by `ehub topology`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkStats {
    pub node_count: usize,
    pub arc_count: usize,
    pub components: usize,
    pub max_degree: usize,
    pub density: f64,
    pub isolated: Vec<String>,
}
