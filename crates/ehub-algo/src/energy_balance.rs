//! Energy Balance Assembler
//!
//! For every carrier c, node n and time step t:
//!
//! ```text
//! Σ output[t,c] + inflow[t,c,n] = demand[t,c,n] + Σ input[t,c]
//! ```
//!
//! Rows without any variable and with zero demand are skipped. A row without
//! variables but with positive demand is kept; it makes the model infeasible,
//! which is the correct answer for unserved demand.

use crate::network::NetworkModel;
use crate::node::NodeModel;
use crate::problem::{LinearExpr, MilpModel};
use ehub_core::HubData;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Add every balance row; returns the number of rows added.
pub fn add_energy_balance(
    model: &mut MilpModel,
    data: &HubData,
    nodes: &BTreeMap<String, NodeModel>,
    networks: &[NetworkModel],
) -> usize {
    let topology = &data.topology;
    let mut rows = 0;

    for carrier in &topology.carriers {
        let carrier_networks: Vec<&NetworkModel> =
            networks.iter().filter(|n| &n.carrier == carrier).collect();

        for (name, node) in nodes {
            let node_data = data.node(name);
            for t in 0..topology.time_steps() {
                let demand = node_data.map_or(0.0, |d| d.demand_at(carrier, t));

                let mut supply: LinearExpr = node.production(carrier, t);
                for network in &carrier_networks {
                    supply += network.net_inflow(name, t);
                }
                let use_side = node.consumption(carrier, t) + demand;

                if supply.is_empty() && use_side.is_empty() {
                    if demand == 0.0 {
                        continue;
                    }
                    warn!(
                        carrier = %carrier,
                        node = %name,
                        step = t + 1,
                        demand,
                        "demand cannot be served: no technology or network supplies it"
                    );
                }

                model.add_eq(
                    format!("balance[{},{},{}]", carrier, name, t + 1),
                    supply,
                    use_side,
                );
                rows += 1;
            }
        }
    }

    debug!(rows, "energy balance assembled");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::build_network;
    use crate::node::build_node;
    use crate::test_utils::two_node_case;

    #[test]
    fn test_balance_links_production_network_and_demand() {
        let data = two_node_case();
        let mut model = MilpModel::new();
        let mut nodes = BTreeMap::new();
        for (node, techs) in &data.topology.technologies {
            nodes.insert(node.clone(), build_node(&mut model, node, techs, &data).unwrap());
        }
        let grid = &data.topology.networks["electricity"]["grid"];
        let net = build_network(
            &mut model,
            "electricity",
            "grid",
            grid,
            &data.topology.nodes,
            2,
        )
        .unwrap();

        let rows = add_energy_balance(&mut model, &data, &nodes, std::slice::from_ref(&net));
        // electricity at both nodes, no heat anywhere
        assert_eq!(rows, 4);

        let city = model.find_constraint("balance[electricity,city,2]").unwrap();
        let flow = net.arc("rural", "city").unwrap().flows[1];
        assert_eq!(city.lhs.coefficient(flow), 1.0);
        assert_eq!(city.rhs, 4.0);

        let rural = model.find_constraint("balance[electricity,rural,1]").unwrap();
        let pv = nodes["rural"].technology("PV").unwrap();
        assert_eq!(rural.lhs.coefficient(pv.output("electricity", 0).unwrap()), 1.0);
        assert_eq!(rural.lhs.coefficient(net.arc("rural", "city").unwrap().flows[0]), -1.0);
        assert_eq!(rural.rhs, 0.0);
    }
}
