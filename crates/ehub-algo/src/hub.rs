//! Model Orchestrator
//!
//! [`EnergyHub`] owns the global sets, the node and network submodels and the
//! assembled [`MilpModel`]. Construction is a single pass in dependency order:
//!
//! ```text
//! sets ─► networks ─► nodes (technologies) ─► energy balance ─► objective
//! ```
//!
//! After construction the model is immutable except for the big-M rewrite
//! (which only runs when a piecewise CAPEX curve requested it) and the
//! solver-assigned values.

use crate::energy_balance::add_energy_balance;
use crate::network::{build_network, NetworkModel};
use crate::node::{build_node, NodeModel};
use crate::problem::{LinearExpr, MilpModel, ModelStats, Transformation};
use crate::solve::{solve_model, HubSolution, SolveStatus, SolverKind};
use crate::transform::{apply_big_m, DEFAULT_BIG_M};
use ehub_core::{HubData, HubError, HubResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{info, warn};

/// Objective selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveKind {
    /// Minimise the sum of node costs
    #[default]
    Cost,
    /// Minimise emissions (not implemented)
    Emissions,
    /// Cost/emissions pareto front (not implemented)
    Pareto,
}

impl ObjectiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectiveKind::Cost => "cost",
            ObjectiveKind::Emissions => "emissions",
            ObjectiveKind::Pareto => "pareto",
        }
    }
}

impl FromStr for ObjectiveKind {
    type Err = HubError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "cost" | "costs" => Ok(ObjectiveKind::Cost),
            "emissions" | "emissions_pos" => Ok(ObjectiveKind::Emissions),
            "pareto" => Ok(ObjectiveKind::Pareto),
            other => Err(HubError::Config(format!(
                "unknown objective '{other}'; expected cost, emissions or pareto"
            ))),
        }
    }
}

/// Construction options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub objective: ObjectiveKind,
    /// Fallback big-M when a disjunct row has no finite bounds
    pub big_m: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            objective: ObjectiveKind::Cost,
            big_m: DEFAULT_BIG_M,
        }
    }
}

/// Global sets of the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubSets {
    pub nodes: Vec<String>,
    pub carriers: Vec<String>,
    /// Number of time steps T; steps are indexed 1..=T
    pub time_steps: usize,
    pub timestep_labels: Vec<String>,
    /// Climate variable names, taken from the first node's climate data
    pub climate_vars: Vec<String>,
    pub technologies: BTreeMap<String, Vec<String>>,
}

impl HubSets {
    /// Build the global sets, failing on the first node mapping that does not
    /// match the node set, then on any set or demand series finding.
    pub fn from_data(data: &HubData) -> HubResult<Self> {
        let topology = &data.topology;

        for node in topology.technologies.keys() {
            if !topology.nodes.contains(node) {
                return Err(HubError::UnknownNode(node.clone()));
            }
        }
        for node in &topology.nodes {
            if !topology.technologies.contains_key(node) {
                return Err(HubError::Config(format!(
                    "node '{node}' has no entry in the technology mapping"
                )));
            }
        }
        if topology.timesteps.is_empty() {
            return Err(HubError::Config("the horizon has no time steps".into()));
        }
        let diag = data.validate_sets().into_result("hub input data")?;
        for issue in diag.warnings() {
            warn!("{issue}");
        }

        let climate_vars = topology
            .nodes
            .first()
            .and_then(|n| data.node(n))
            .map(|d| d.climate_data.keys().cloned().collect())
            .unwrap_or_default();

        Ok(Self {
            nodes: topology.nodes.clone(),
            carriers: topology.carriers.clone(),
            time_steps: topology.timesteps.len(),
            timestep_labels: topology.timesteps.clone(),
            climate_vars,
            technologies: topology.technologies.clone(),
        })
    }

    pub fn technology_count(&self) -> usize {
        self.technologies.values().map(Vec::len).sum()
    }
}

/// Summary of a constructed hub.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubStats {
    pub nodes: usize,
    pub carriers: usize,
    pub time_steps: usize,
    pub technologies: usize,
    pub networks: usize,
    pub arcs: usize,
    pub balance_rows: usize,
    pub big_m_required: bool,
    pub model: ModelStats,
}

/// Energy hub aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyHub {
    pub(crate) data: HubData,
    pub(crate) config: ModelConfig,
    pub(crate) sets: HubSets,
    pub(crate) model: MilpModel,
    pub(crate) nodes: BTreeMap<String, NodeModel>,
    pub(crate) networks: Vec<NetworkModel>,
    pub(crate) balance_rows: usize,
    pub(crate) constructed: bool,
    pub(crate) solution: Option<HubSolution>,
}

impl EnergyHub {
    /// Create the hub and its global sets. Nothing is built yet.
    pub fn new(data: HubData) -> HubResult<Self> {
        Self::with_config(data, ModelConfig::default())
    }

    pub fn with_config(data: HubData, config: ModelConfig) -> HubResult<Self> {
        let sets = HubSets::from_data(&data)?;
        info!(
            nodes = sets.nodes.len(),
            carriers = sets.carriers.len(),
            time_steps = sets.time_steps,
            technologies = sets.technology_count(),
            "global sets created"
        );
        Ok(Self {
            data,
            config,
            sets,
            model: MilpModel::new(),
            nodes: BTreeMap::new(),
            networks: Vec::new(),
            balance_rows: 0,
            constructed: false,
            solution: None,
        })
    }

    /// Build networks, nodes, the energy balance and the objective.
    ///
    /// Calling it again rebuilds the model from scratch.
    pub fn construct_model(&mut self) -> HubResult<()> {
        if self.config.objective != ObjectiveKind::Cost {
            return Err(HubError::Unsupported(format!(
                "objective '{}' is not implemented; only 'cost' is available",
                self.config.objective.as_str()
            )));
        }

        let mut model = MilpModel::new();
        let time_steps = self.sets.time_steps;

        info!("constructing networks");
        let mut networks = Vec::new();
        for (carrier, name, net) in self.data.topology.networks_iter() {
            if !self.sets.carriers.iter().any(|c| c == carrier) {
                return Err(HubError::Config(format!(
                    "network '{name}' belongs to unknown carrier '{carrier}'"
                )));
            }
            networks.push(build_network(
                &mut model,
                carrier,
                name,
                net,
                &self.sets.nodes,
                time_steps,
            )?);
        }

        info!("constructing nodes");
        let mut nodes = BTreeMap::new();
        for node in &self.sets.nodes {
            let technologies = self
                .sets
                .technologies
                .get(node)
                .map(Vec::as_slice)
                .unwrap_or_default();
            nodes.insert(
                node.clone(),
                build_node(&mut model, node, technologies, &self.data)?,
            );
        }

        info!("constructing energy balance");
        let balance_rows = add_energy_balance(&mut model, &self.data, &nodes, &networks);

        let objective: LinearExpr = nodes.values().map(|n| LinearExpr::from(n.cost)).sum();
        model.set_objective(objective);

        let stats = model.stats();
        info!(
            variables = stats.variables,
            constraints = stats.constraints,
            disjunctions = stats.disjunctions,
            big_m_required = model.requires(Transformation::BigM),
            "model constructed"
        );

        self.model = model;
        self.nodes = nodes;
        self.networks = networks;
        self.balance_rows = balance_rows;
        self.constructed = true;
        self.solution = None;
        Ok(())
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Whether a big-M/disjunctive rewrite must run before solving.
    pub fn big_m_required(&self) -> bool {
        self.model.requires(Transformation::BigM)
    }

    pub fn pending_transformations(&self) -> Vec<Transformation> {
        self.model.pending().iter().copied().collect()
    }

    /// Run every pending model-wide transformation.
    pub fn apply_transformations(&mut self) -> HubResult<()> {
        self.ensure_constructed()?;
        if self.big_m_required() {
            let rewritten = apply_big_m(&mut self.model, self.config.big_m)?;
            info!(disjunctions = rewritten, "big-M transformation applied");
        }
        Ok(())
    }

    /// Apply pending transformations and solve.
    pub fn solve(&mut self, kind: SolverKind) -> HubResult<SolveStatus> {
        self.apply_transformations()?;
        let solution = solve_model(&self.model, kind)?;
        let status = solution.status;
        self.solution = Some(solution);
        Ok(status)
    }

    pub fn data(&self) -> &HubData {
        &self.data
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn sets(&self) -> &HubSets {
        &self.sets
    }

    pub fn model(&self) -> &MilpModel {
        &self.model
    }

    pub fn nodes(&self) -> &BTreeMap<String, NodeModel> {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> HubResult<&NodeModel> {
        self.ensure_constructed()?;
        self.nodes
            .get(name)
            .ok_or_else(|| HubError::UnknownNode(name.to_string()))
    }

    pub fn networks(&self) -> &[NetworkModel] {
        &self.networks
    }

    pub fn solution(&self) -> Option<&HubSolution> {
        self.solution.as_ref()
    }

    pub fn stats(&self) -> HubResult<HubStats> {
        self.ensure_constructed()?;
        Ok(HubStats {
            nodes: self.sets.nodes.len(),
            carriers: self.sets.carriers.len(),
            time_steps: self.sets.time_steps,
            technologies: self.sets.technology_count(),
            networks: self.networks.len(),
            arcs: self.networks.iter().map(|n| n.arcs.len()).sum(),
            balance_rows: self.balance_rows,
            big_m_required: self.big_m_required(),
            model: self.model.stats(),
        })
    }

    pub(crate) fn ensure_constructed(&self) -> HubResult<()> {
        if self.constructed {
            Ok(())
        } else {
            Err(HubError::NotBuilt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{single_node_case, two_node_case};

    #[test]
    fn test_sets_from_topology() {
        let hub = EnergyHub::new(single_node_case()).unwrap();
        let sets = hub.sets();
        assert_eq!(sets.nodes, vec!["city".to_string()]);
        assert_eq!(sets.time_steps, 2);
        assert_eq!(sets.climate_vars, vec!["ghi".to_string()]);
        assert_eq!(sets.technology_count(), 1);
    }

    #[test]
    fn test_unknown_node_fails_fast() {
        let mut data = single_node_case();
        data.topology
            .technologies
            .insert("offshore".into(), vec!["PV".into()]);
        let err = EnergyHub::new(data).unwrap_err();
        match err {
            HubError::UnknownNode(node) => assert_eq!(node, "offshore"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_inconsistent_demand_fails_before_construction() {
        let mut data = single_node_case();
        let city = data.node_data.get_mut("city").unwrap();
        city.demand.insert("electricity".into(), vec![3.0]);
        city.demand.insert("hydrogen".into(), vec![5.0, 5.0]);
        match EnergyHub::new(data).unwrap_err() {
            HubError::Validation { entity, issues } => {
                assert_eq!(entity, "hub input data");
                assert_eq!(issues.len(), 2);
                assert!(issues.iter().any(|m| m.contains("1 values but the horizon has 2")));
                assert!(issues.iter().any(|m| m.contains("'hydrogen' is not in the set")));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_duplicate_node_fails_before_construction() {
        let mut data = two_node_case();
        data.topology.nodes.push("rural".into());
        let err = EnergyHub::new(data).unwrap_err();
        assert!(err.to_string().contains("node 'rural' is declared twice"));
    }

    #[test]
    fn test_node_without_mapping_fails() {
        let mut data = single_node_case();
        data.topology.technologies.clear();
        assert!(matches!(EnergyHub::new(data), Err(HubError::Config(_))));
    }

    #[test]
    fn test_alternative_objectives_unsupported() {
        let config = ModelConfig {
            objective: ObjectiveKind::Pareto,
            ..ModelConfig::default()
        };
        let mut hub = EnergyHub::with_config(single_node_case(), config).unwrap();
        let err = hub.construct_model().unwrap_err();
        assert!(matches!(err, HubError::Unsupported(_)));
        assert!(!hub.is_constructed());
    }

    #[test]
    fn test_objective_is_sum_of_node_costs() {
        let mut hub = EnergyHub::new(two_node_case()).unwrap();
        hub.construct_model().unwrap();
        let objective = hub.model().objective();
        assert_eq!(objective.terms.len(), 2);
        for node in hub.nodes().values() {
            assert_eq!(objective.coefficient(node.cost), 1.0);
        }
    }

    #[test]
    fn test_stats_require_construction() {
        let mut hub = EnergyHub::new(two_node_case()).unwrap();
        assert!(matches!(hub.stats(), Err(HubError::NotBuilt)));
        hub.construct_model().unwrap();
        let stats = hub.stats().unwrap();
        assert_eq!(stats.networks, 1);
        assert_eq!(stats.arcs, 1);
        assert_eq!(stats.balance_rows, 4);
        assert!(!stats.big_m_required);
    }

    #[test]
    fn test_objective_parsing() {
        assert_eq!("Cost".parse::<ObjectiveKind>().unwrap(), ObjectiveKind::Cost);
        assert!("profit".parse::<ObjectiveKind>().is_err());
    }
}
