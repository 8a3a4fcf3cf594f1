//! Network Assembler
//!
//! One flow variable per connected ordered node pair and time step, bounded
//! by the network capacity. A disallowed direction has no variable at all.
//!
//! ```text
//! 0 ≤ flow[t,m,n] ≤ capacity                       (m, n) connected
//! inflow[t,n] = Σ_m (1 − loss) flow[t,m,n] − Σ_m flow[t,n,m]
//! ```

use crate::problem::{LinearExpr, MilpModel, VarId, VariableDef};
use ehub_core::{Diagnostics, HubResult, NetworkData};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Flow variables of one directed arc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub from: String,
    pub to: String,
    pub flows: Vec<VarId>,
}

/// Submodel of one named network of a carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkModel {
    pub carrier: String,
    pub name: String,
    pub capacity: f64,
    pub loss: f64,
    pub arcs: Vec<Arc>,
}

impl NetworkModel {
    pub fn label(&self) -> String {
        format!("{}/{}", self.carrier, self.name)
    }

    pub fn arc(&self, from: &str, to: &str) -> Option<&Arc> {
        self.arcs.iter().find(|a| a.from == from && a.to == to)
    }

    /// Net inflow at `node` in time step `t` (0-based); empty when the node
    /// has no arc in this network.
    pub fn net_inflow(&self, node: &str, t: usize) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for arc in &self.arcs {
            if arc.to == node {
                expr.add_term(arc.flows[t], 1.0 - self.loss);
            }
            if arc.from == node {
                expr.add_term(arc.flows[t], -1.0);
            }
        }
        expr
    }
}

/// Validate `data` and declare its flow variables.
pub fn build_network(
    model: &mut MilpModel,
    carrier: &str,
    name: &str,
    data: &NetworkData,
    nodes: &[String],
    time_steps: usize,
) -> HubResult<NetworkModel> {
    let label = format!("{carrier}/{name}");
    let mut diag = Diagnostics::new();
    data.validate_into(nodes, &format!("network {label}"), &mut diag);
    let diag = diag.into_result(&format!("network '{name}' of carrier '{carrier}'"))?;
    for issue in diag.warnings() {
        warn!("{}", issue);
    }

    let arcs: Vec<Arc> = data
        .connection
        .connected_pairs()
        .into_iter()
        .map(|(from, to)| Arc {
            from: from.to_string(),
            to: to.to_string(),
            flows: (1..=time_steps)
                .map(|t| {
                    model.add_variable(
                        VariableDef::non_negative(format!("{label}/flow[{from},{to},{t}]"))
                            .max(data.capacity),
                    )
                })
                .collect(),
        })
        .collect();

    debug!(network = %label, arcs = arcs.len(), "network submodel built");
    Ok(NetworkModel {
        carrier: carrier.to_string(),
        name: name.to_string(),
        capacity: data.capacity,
        loss: data.loss,
        arcs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ehub_core::ConnectionMatrix;

    fn nodes() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    #[test]
    fn test_flows_only_for_connected_pairs() {
        let mut model = MilpModel::new();
        let data = NetworkData::new(
            ConnectionMatrix::from_arcs(nodes(), &[("a", "b"), ("b", "c")]),
            15.0,
        );
        let net = build_network(&mut model, "electricity", "grid", &data, &nodes(), 3).unwrap();

        assert_eq!(net.arcs.len(), 2);
        assert_eq!(model.num_variables(), 6);
        assert!(net.arc("b", "a").is_none());
        let flow = net.arc("a", "b").unwrap().flows[0];
        assert_eq!(model.variable(flow).upper, Some(15.0));
    }

    #[test]
    fn test_net_inflow_applies_losses() {
        let mut model = MilpModel::new();
        let mut data = NetworkData::new(
            ConnectionMatrix::from_arcs(nodes(), &[("a", "b"), ("b", "c")]),
            15.0,
        );
        data.loss = 0.1;
        let net = build_network(&mut model, "heat", "dh", &data, &nodes(), 1).unwrap();

        let ab = net.arc("a", "b").unwrap().flows[0];
        let bc = net.arc("b", "c").unwrap().flows[0];
        let inflow = net.net_inflow("b", 0);
        assert!((inflow.coefficient(ab) - 0.9).abs() < 1e-12);
        assert_eq!(inflow.coefficient(bc), -1.0);
        assert!(net.net_inflow("z", 0).is_empty());
    }

    #[test]
    fn test_diagonal_is_ignored() {
        let mut model = MilpModel::new();
        let data = NetworkData::new(
            ConnectionMatrix {
                nodes: vec!["a".into(), "b".into()],
                matrix: vec![vec![1, 0], vec![0, 1]],
            },
            1.0,
        );
        let net = build_network(&mut model, "electricity", "grid", &data, &nodes(), 2).unwrap();
        assert!(net.arcs.is_empty());
    }

    #[test]
    fn test_unknown_node_rejected() {
        let mut model = MilpModel::new();
        let data = NetworkData::new(
            ConnectionMatrix::from_arcs(vec!["a".into(), "x".into()], &[("a", "x")]),
            1.0,
        );
        let err = build_network(&mut model, "electricity", "grid", &data, &nodes(), 1).unwrap_err();
        assert!(err.to_string().contains("'x'"));
    }
}
