//! Solved values per technology, node and network.

use crate::hub::EnergyHub;
use crate::network::NetworkModel;
use crate::problem::VarId;
use crate::solve::HubSolution;
use crate::technology::TechnologyModel;
use ehub_core::{Euros, HubError, HubResult, Megawatts};
use serde::Serialize;
use std::collections::BTreeMap;

/// Solved values of one technology.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnologyResult {
    pub node: String,
    pub technology: String,
    /// Installed size (MW, or units for integer sizing)
    pub size: f64,
    pub capex: Euros,
    pub opex_fixed: Euros,
    pub opex_variable: Vec<Euros>,
    pub inputs: BTreeMap<String, Vec<Megawatts>>,
    pub outputs: BTreeMap<String, Vec<Megawatts>>,
}

impl TechnologyResult {
    pub fn opex_variable_total(&self) -> Euros {
        self.opex_variable.iter().sum()
    }

    pub fn total_cost(&self) -> Euros {
        self.capex + self.opex_fixed + self.opex_variable_total()
    }
}

/// Solved flows of one network arc.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArcFlows {
    pub network: String,
    pub from: String,
    pub to: String,
    pub flows: Vec<Megawatts>,
}

fn value(solution: &HubSolution, var: VarId) -> HubResult<f64> {
    solution
        .value(var)
        .ok_or_else(|| HubError::Solver(format!("no value for variable {}", var.index())))
}

fn series(solution: &HubSolution, vars: &BTreeMap<String, Vec<VarId>>) -> HubResult<BTreeMap<String, Vec<Megawatts>>> {
    vars.iter()
        .map(|(carrier, flows)| {
            let values = flows
                .iter()
                .map(|v| value(solution, *v).map(Megawatts))
                .collect::<HubResult<Vec<_>>>()?;
            Ok((carrier.clone(), values))
        })
        .collect()
}

impl TechnologyResult {
    fn from_model(tec: &TechnologyModel, solution: &HubSolution) -> HubResult<Self> {
        Ok(Self {
            node: tec.node.clone(),
            technology: tec.name.clone(),
            size: value(solution, tec.size)?,
            capex: Euros(value(solution, tec.capex)?),
            opex_fixed: Euros(value(solution, tec.opex_fixed)?),
            opex_variable: tec
                .opex_variable
                .iter()
                .map(|v| value(solution, *v).map(Euros))
                .collect::<HubResult<_>>()?,
            inputs: series(solution, &tec.inputs)?,
            outputs: series(solution, &tec.outputs)?,
        })
    }
}

impl EnergyHub {
    fn optimal_solution(&self) -> HubResult<&HubSolution> {
        self.ensure_constructed()?;
        match &self.solution {
            Some(solution) if solution.is_optimal() => Ok(solution),
            Some(solution) => Err(HubError::Solver(format!(
                "no values available: solver reported {}",
                solution.status
            ))),
            None => Err(HubError::NotSolved),
        }
    }

    /// Solved values of `technology` at `node`.
    pub fn technology_result(&self, node: &str, technology: &str) -> HubResult<TechnologyResult> {
        let solution = self.optimal_solution()?;
        let tec = self
            .node(node)?
            .technology(technology)
            .ok_or_else(|| HubError::UnknownTechnology {
                node: node.to_string(),
                technology: technology.to_string(),
            })?;
        TechnologyResult::from_model(tec, solution)
    }

    /// Results of every technology at `node`, by technology name.
    pub fn node_results(&self, node: &str) -> HubResult<BTreeMap<String, TechnologyResult>> {
        let solution = self.optimal_solution()?;
        self.node(node)?
            .technologies
            .iter()
            .map(|(name, tec)| Ok((name.clone(), TechnologyResult::from_model(tec, solution)?)))
            .collect()
    }

    pub fn node_cost(&self, node: &str) -> HubResult<Euros> {
        let solution = self.optimal_solution()?;
        Ok(Euros(value(solution, self.node(node)?.cost)?))
    }

    pub fn total_cost(&self) -> HubResult<Euros> {
        let solution = self.optimal_solution()?;
        solution
            .objective
            .map(Euros)
            .ok_or_else(|| HubError::Solver("solution has no objective value".into()))
    }

    pub fn network_flows(&self) -> HubResult<Vec<ArcFlows>> {
        let solution = self.optimal_solution()?;
        let mut out = Vec::new();
        for network in &self.networks {
            out.extend(arc_flows(network, solution)?);
        }
        Ok(out)
    }
}

fn arc_flows(network: &NetworkModel, solution: &HubSolution) -> HubResult<Vec<ArcFlows>> {
    network
        .arcs
        .iter()
        .map(|arc| {
            Ok(ArcFlows {
                network: network.label(),
                from: arc.from.clone(),
                to: arc.to.clone(),
                flows: arc
                    .flows
                    .iter()
                    .map(|v| value(solution, *v).map(Megawatts))
                    .collect::<HubResult<_>>()?,
            })
        })
        .collect()
}
