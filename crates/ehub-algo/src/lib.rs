//! # ehub-algo: Energy Hub Model Construction
//!
//! Builds a mixed-integer linear program for a network of energy hubs from
//! validated [`ehub_core::HubData`], solves it through `good_lp` and reads the
//! results back.
//!
//! ## Construction pipeline
//!
//! | Stage | Entry point | Adds |
//! |-------|-------------|------|
//! | Sets | [`EnergyHub::new`] | nodes, carriers, time steps, technology mapping |
//! | Networks | [`network::build_network`] | one flow per arc and step, capacity rows |
//! | Technologies | [`TechnologyBuilder::build`] | size, flows, cost rows, archetype rows |
//! | Nodes | [`node::build_node`] | node cost aggregation |
//! | Energy balance | [`energy_balance::add_energy_balance`] | supply = demand per node, carrier, step |
//! | Objective | [`EnergyHub::construct_model`] | sum of node costs |
//!
//! Piecewise CAPEX curves are stored as disjunctions and mark the model as
//! requiring the big-M rewrite ([`transform::apply_big_m`]), which
//! [`EnergyHub::solve`] runs before handing the model to a backend.
//!
//! ## Technology archetypes
//!
//! | Archetype | Behaviour |
//! |-----------|-----------|
//! | RES | output bounded by capacity factor × size |
//! | CONV1 | interchangeable inputs, pooled output |
//! | CONV2 | fixed output ratios per output carrier |
//! | CONV3 | single input, flexible output split |
//! | STOR | state-of-charge balance with charge/discharge limits |
//!
//! ## Example
//!
//! ```ignore
//! use ehub_algo::{EnergyHub, SolverKind};
//! use ehub_core::HubData;
//!
//! let data = HubData::load("case.json")?;
//! let mut hub = EnergyHub::new(data)?;
//! hub.construct_model()?;
//! hub.solve(SolverKind::Clarabel)?;
//! println!("Total cost: {}", hub.total_cost()?);
//! ```

pub mod energy_balance;
#[cfg(feature = "desktop")]
pub mod export;
pub mod hub;
pub mod network;
pub mod node;
pub mod problem;
pub mod results;
pub mod snapshot;
pub mod solve;
pub mod technology;
pub mod test_utils;
pub mod transform;

#[cfg(feature = "desktop")]
pub use export::export_results;
pub use hub::{EnergyHub, HubSets, HubStats, ModelConfig, ObjectiveKind};
pub use network::{Arc, NetworkModel};
pub use node::NodeModel;
pub use problem::{
    Constraint, Disjunction, Domain, LinearExpr, MilpModel, ModelStats, Sense, Transformation,
    VarId, VariableDef, Violation,
};
pub use results::{ArcFlows, TechnologyResult};
pub use snapshot::SNAPSHOT_FORMAT_VERSION;
pub use solve::{solve_model, HubSolution, SolveStatus, SolverKind};
pub use technology::archetype::{constraints_for, ArchetypeConstraints, Conversion, ConversionRule};
pub use technology::{TechnologyBuilder, TechnologyModel, TechnologyParams};
pub use transform::{apply_big_m, DEFAULT_BIG_M};
