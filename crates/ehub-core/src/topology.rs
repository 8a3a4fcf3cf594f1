//! Topology and per-node input bundles.
//!
//! [`HubData`] is everything the model-construction engine consumes: the
//! topology (global sets and networks), per-node demand and climate series,
//! and per-node technology data. It is deserialised from one JSON case file.

use crate::diagnostics::Diagnostics;
use crate::network::NetworkData;
use crate::technology::TechnologyData;
use crate::{HubError, HubResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Global sets and networks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub nodes: Vec<String>,
    pub carriers: Vec<String>,
    /// Ordered time-step labels; step `t` (1-based) is `timesteps[t - 1]`
    pub timesteps: Vec<String>,
    /// Technology names per node
    pub technologies: BTreeMap<String, Vec<String>>,
    /// Named networks per carrier
    #[serde(default)]
    pub networks: BTreeMap<String, BTreeMap<String, NetworkData>>,
}

impl Topology {
    pub fn time_steps(&self) -> usize {
        self.timesteps.len()
    }

    /// `(carrier, name, network)` for every network, in carrier then name order.
    pub fn networks_iter(&self) -> impl Iterator<Item = (&str, &str, &NetworkData)> {
        self.networks.iter().flat_map(|(carrier, nets)| {
            nets.iter()
                .map(move |(name, net)| (carrier.as_str(), name.as_str(), net))
        })
    }

    fn validate_into(&self, diag: &mut Diagnostics) {
        self.validate_sets_into(diag);
        for (carrier, nets) in &self.networks {
            if !self.carriers.contains(carrier) {
                diag.add_error(
                    "network",
                    &format!("networks declared for unknown carrier '{carrier}'"),
                );
            }
            for (name, net) in nets {
                net.validate_into(&self.nodes, &format!("network {carrier}/{name}"), diag);
            }
        }
    }

    fn validate_sets_into(&self, diag: &mut Diagnostics) {
        if self.timesteps.is_empty() {
            diag.add_error("topology", "the horizon has no time steps");
        }
        for (label, names) in [("node", &self.nodes), ("carrier", &self.carriers)] {
            let mut seen = BTreeSet::new();
            for name in names {
                if !seen.insert(name.as_str()) {
                    diag.add_error("topology", &format!("{label} '{name}' is declared twice"));
                }
            }
        }

        for node in self.technologies.keys() {
            if !self.nodes.contains(node) {
                diag.add_error(
                    "topology",
                    &format!("the node '{node}' does not exist in the set of nodes"),
                );
            }
        }
        for node in &self.nodes {
            if !self.technologies.contains_key(node) {
                diag.add_error(
                    "topology",
                    &format!("node '{node}' has no entry in the technology mapping"),
                );
            }
        }
    }
}

/// Demand and climate series of one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Demand per carrier and time step (MW); missing carriers have zero demand
    #[serde(default)]
    pub demand: BTreeMap<String, Vec<f64>>,
    /// Climate variables (e.g. irradiance, temperature) per time step
    #[serde(default)]
    pub climate_data: BTreeMap<String, Vec<f64>>,
}

impl NodeData {
    /// Demand of `carrier` at 0-based step index `t`.
    pub fn demand_at(&self, carrier: &str, t: usize) -> f64 {
        self.demand
            .get(carrier)
            .and_then(|series| series.get(t))
            .copied()
            .unwrap_or(0.0)
    }

    fn validate_into(
        &self,
        carriers: &[String],
        time_steps: usize,
        node: &str,
        diag: &mut Diagnostics,
    ) {
        for (carrier, series) in &self.demand {
            let entity = format!("{node}/demand/{carrier}");
            if !carriers.contains(carrier) {
                diag.add_error_with_entity(
                    "demand",
                    &format!("carrier '{carrier}' is not in the set of carriers"),
                    &entity,
                );
            }
            if series.len() != time_steps {
                diag.add_error_with_entity(
                    "demand",
                    &format!(
                        "series has {} values but the horizon has {} time steps",
                        series.len(),
                        time_steps
                    ),
                    &entity,
                );
            }
            if series.iter().any(|v| !v.is_finite()) {
                diag.add_error_with_entity("demand", "series contains non-finite values", &entity);
            }
        }
        for (variable, series) in &self.climate_data {
            if series.len() != time_steps {
                diag.add_warning_with_entity(
                    "climate",
                    &format!(
                        "series has {} values but the horizon has {} time steps",
                        series.len(),
                        time_steps
                    ),
                    &format!("{node}/climate/{variable}"),
                );
            }
        }
    }
}

/// Complete input bundle of an energy hub case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubData {
    pub topology: Topology,
    #[serde(default)]
    pub node_data: BTreeMap<String, NodeData>,
    /// Technology data per node and technology name
    #[serde(default)]
    pub technology_data: BTreeMap<String, BTreeMap<String, TechnologyData>>,
}

impl HubData {
    pub fn from_json_str(json: &str) -> HubResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON case file.
    pub fn load(path: impl AsRef<Path>) -> HubResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
            .map_err(|e| HubError::Parse(format!("{}: {}", path.display(), e)))
    }

    pub fn node(&self, node: &str) -> Option<&NodeData> {
        self.node_data.get(node)
    }

    pub fn technology(&self, node: &str, technology: &str) -> HubResult<&TechnologyData> {
        self.technology_data
            .get(node)
            .and_then(|techs| techs.get(technology))
            .ok_or_else(|| HubError::UnknownTechnology {
                node: node.to_string(),
                technology: technology.to_string(),
            })
    }

    /// Run every check over the bundle and collect the findings.
    pub fn validate(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        let topo = &self.topology;
        topo.validate_into(&mut diag);
        self.validate_node_data_into(&mut diag);
        let time_steps = topo.time_steps();

        for (node, names) in &topo.technologies {
            for name in names {
                let entity = format!("{node}/{name}");
                match self.technology(node, name) {
                    Ok(tec) => tec.validate_into(&topo.carriers, time_steps, &entity, &mut diag),
                    Err(_) => diag.add_error_with_entity(
                        "technology",
                        "no technology data given",
                        &entity,
                    ),
                }
            }
        }

        diag
    }

    /// Checks on the global sets and the demand series only.
    ///
    /// Networks and technologies are checked by their own builders.
    pub fn validate_sets(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        self.topology.validate_sets_into(&mut diag);
        self.validate_node_data_into(&mut diag);
        diag
    }

    fn validate_node_data_into(&self, diag: &mut Diagnostics) {
        let topo = &self.topology;
        for node in self.node_data.keys() {
            if !topo.nodes.contains(node) {
                diag.add_warning(
                    "demand",
                    &format!("data given for node '{node}', which is not in the set of nodes"),
                );
            }
        }
        for node in &topo.nodes {
            if let Some(data) = self.node_data.get(node) {
                data.validate_into(&topo.carriers, topo.time_steps(), node, diag);
            }
        }
    }
}
