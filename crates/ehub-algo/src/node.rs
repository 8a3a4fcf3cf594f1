//! Node Assembler
//!
//! Collects the technology submodels of a node and ties the node cost
//! variable to their aggregate:
//!
//! ```text
//! cost_n = Σ_tec ( CAPEX + Σ_t OPEX_var[t] + OPEX_fixed )
//! ```

use crate::problem::{LinearExpr, MilpModel, Transformation, VarId, VariableDef};
use crate::technology::{TechnologyBuilder, TechnologyModel};
use ehub_core::{HubData, HubResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Node-level submodel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeModel {
    pub name: String,
    pub technologies: BTreeMap<String, TechnologyModel>,
    /// Total cost of the node's technologies
    pub cost: VarId,
}

impl NodeModel {
    pub fn technology(&self, name: &str) -> Option<&TechnologyModel> {
        self.technologies.get(name)
    }

    /// `Σ output[t, carrier]` over the node's technologies producing `carrier`.
    pub fn production(&self, carrier: &str, t: usize) -> LinearExpr {
        LinearExpr::sum_of(
            self.technologies
                .values()
                .filter_map(|tec| tec.outputs.get(carrier))
                .filter_map(|flows| flows.get(t)),
        )
    }

    /// `Σ input[t, carrier]` over the node's technologies consuming `carrier`.
    pub fn consumption(&self, carrier: &str, t: usize) -> LinearExpr {
        LinearExpr::sum_of(
            self.technologies
                .values()
                .filter_map(|tec| tec.inputs.get(carrier))
                .filter_map(|flows| flows.get(t)),
        )
    }

    pub fn pending(&self) -> BTreeSet<Transformation> {
        self.technologies
            .values()
            .flat_map(|tec| tec.pending.iter().copied())
            .collect()
    }
}

/// Build every technology of `node` and the node cost aggregate.
pub fn build_node(
    model: &mut MilpModel,
    node: &str,
    technologies: &[String],
    data: &HubData,
) -> HubResult<NodeModel> {
    let carriers = &data.topology.carriers;
    let time_steps = data.topology.time_steps();

    let mut built = BTreeMap::new();
    {
        let mut builder = TechnologyBuilder::new(model, carriers, time_steps);
        for name in technologies {
            let tec_data = data.technology(node, name)?;
            built.insert(name.clone(), builder.build(node, name, tec_data)?);
        }
    }

    let cost = model.add_variable(VariableDef::non_negative(format!("{node}/cost")));
    let aggregate: LinearExpr = built.values().map(TechnologyModel::total_cost).sum();
    model.add_eq(format!("{node}/cost"), cost, aggregate);

    debug!(node, technologies = built.len(), "node submodel built");
    Ok(NodeModel {
        name: node.to_string(),
        technologies: built,
        cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::single_node_case;

    #[test]
    fn test_node_cost_sums_technology_costs() {
        let data = single_node_case();
        let mut model = MilpModel::new();
        let techs = data.topology.technologies["city"].clone();
        let node = build_node(&mut model, "city", &techs, &data).unwrap();

        let row = model.find_constraint("city/cost").unwrap();
        let pv = node.technology("PV").unwrap();
        assert_eq!(row.lhs.coefficient(node.cost), 1.0);
        assert_eq!(row.lhs.coefficient(pv.capex), -1.0);
        assert_eq!(row.lhs.coefficient(pv.opex_fixed), -1.0);
        assert_eq!(row.lhs.coefficient(pv.opex_variable[1]), -1.0);
    }

    #[test]
    fn test_unknown_technology_fails() {
        let data = single_node_case();
        let mut model = MilpModel::new();
        let err = build_node(&mut model, "city", &["wind".to_string()], &data).unwrap_err();
        assert!(matches!(err, ehub_core::HubError::UnknownTechnology { .. }));
    }

    #[test]
    fn test_production_only_includes_declared_carriers() {
        let data = single_node_case();
        let mut model = MilpModel::new();
        let techs = data.topology.technologies["city"].clone();
        let node = build_node(&mut model, "city", &techs, &data).unwrap();

        assert_eq!(node.production("electricity", 0).terms.len(), 1);
        assert!(node.consumption("electricity", 0).is_empty());
        assert!(node.production("heat", 0).is_empty());
    }
}
