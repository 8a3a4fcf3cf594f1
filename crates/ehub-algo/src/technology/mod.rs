//! Technology Constraint Builder
//!
//! Builds the submodel of one technology at one node: resolved parameters,
//! decision variables, the cost constraints shared by every archetype and the
//! archetype-specific constraints of [`archetype`].
//!
//! ```text
//! size           ∈ [size_min, size_max]       integer if size_is_integer
//! input[t,c]     ∈ [0, size_max]              declared input carriers only
//! output[t,c]    ∈ [0, output_max]            declared output carriers only
//!
//! CAPEX          = unit_capex · size          (linear)
//!                = y_k + s_k (size − x_k)     (piecewise, one segment k holds)
//! OPEX_fixed     = CAPEX · opex_fixed
//! OPEX_var[t]    = Σ_c output[t,c] · opex_variable
//! Σ_c input[t,c] ≤ size                       conversion archetypes
//! ```

pub mod archetype;
mod capex;

use crate::problem::{LinearExpr, MilpModel, Transformation, VarId, VariableDef};
use ehub_core::{
    Archetype, CapexModel, Diagnostics, HubError, HubResult, TechnologyData,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Parameters of a technology after bound resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyParams {
    pub archetype: Archetype,
    pub size_min: f64,
    pub size_max: f64,
    /// Upper bound of every output flow (equals `size_max`)
    pub output_max: f64,
    pub size_is_integer: bool,
    pub capex_model: CapexModel,
    pub unit_capex: f64,
    pub opex_variable: f64,
    pub opex_fixed: f64,
    pub input_carriers: Vec<String>,
    pub output_carriers: Vec<String>,
}

impl TechnologyParams {
    /// Resolve scalar-or-series size bounds: min of the series for
    /// `size_min`, max of the series for `size_max`.
    pub fn resolve(data: &TechnologyData) -> HubResult<Self> {
        let (size_min, size_max) = data
            .size_range()
            .ok_or_else(|| HubError::Config("size bound series must not be empty".into()))?;
        let input_carriers = if data.archetype().has_input() {
            data.input_carriers.clone()
        } else {
            Vec::new()
        };
        Ok(Self {
            archetype: data.archetype(),
            size_min,
            size_max,
            output_max: size_max,
            size_is_integer: data.size_is_integer,
            capex_model: data.economics.capex_model,
            unit_capex: data.economics.unit_capex,
            opex_variable: data.economics.opex_variable,
            opex_fixed: data.economics.opex_fixed,
            input_carriers,
            output_carriers: data.output_carriers.clone(),
        })
    }
}

/// Variables and parameters of one technology in the assembled model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyModel {
    pub node: String,
    pub name: String,
    pub params: TechnologyParams,
    pub size: VarId,
    /// Input flow per declared input carrier and time step
    pub inputs: BTreeMap<String, Vec<VarId>>,
    /// Output flow per declared output carrier and time step
    pub outputs: BTreeMap<String, Vec<VarId>>,
    pub capex: VarId,
    pub opex_variable: Vec<VarId>,
    pub opex_fixed: VarId,
    /// Stored energy per time step (storage only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub storage_level: Vec<VarId>,
    /// Model-wide rewrites this technology needs before solving
    #[serde(default)]
    pub pending: BTreeSet<Transformation>,
}

impl TechnologyModel {
    pub fn archetype(&self) -> Archetype {
        self.params.archetype
    }

    /// Name prefix of every variable and row of this technology.
    pub fn prefix(&self) -> String {
        format!("{}/{}", self.node, self.name)
    }

    pub fn input(&self, carrier: &str, t: usize) -> Option<VarId> {
        self.inputs.get(carrier).and_then(|v| v.get(t)).copied()
    }

    pub fn output(&self, carrier: &str, t: usize) -> Option<VarId> {
        self.outputs.get(carrier).and_then(|v| v.get(t)).copied()
    }

    /// `Σ_c input[t,c]`; empty for technologies without input.
    pub fn total_input(&self, t: usize) -> LinearExpr {
        LinearExpr::sum_of(self.inputs.values().filter_map(|v| v.get(t)))
    }

    /// `Σ_c output[t,c]`.
    pub fn total_output(&self, t: usize) -> LinearExpr {
        LinearExpr::sum_of(self.outputs.values().filter_map(|v| v.get(t)))
    }

    /// `CAPEX + Σ_t OPEX_var[t] + OPEX_fixed`.
    pub fn total_cost(&self) -> LinearExpr {
        LinearExpr::from(self.capex) + LinearExpr::sum_of(&self.opex_variable) + self.opex_fixed
    }
}

/// Builds technology submodels into a shared [`MilpModel`].
pub struct TechnologyBuilder<'a> {
    model: &'a mut MilpModel,
    carriers: &'a [String],
    time_steps: usize,
}

impl<'a> TechnologyBuilder<'a> {
    pub fn new(model: &'a mut MilpModel, carriers: &'a [String], time_steps: usize) -> Self {
        Self {
            model,
            carriers,
            time_steps,
        }
    }

    /// Validate `data`, then declare the technology's variables and emit its
    /// cost and archetype constraints.
    pub fn build(&mut self, node: &str, name: &str, data: &TechnologyData) -> HubResult<TechnologyModel> {
        let entity = format!("{node}/{name}");
        let mut diag = Diagnostics::new();
        data.validate_into(self.carriers, self.time_steps, &entity, &mut diag);
        let diag = diag.into_result(&format!("technology '{name}' at node '{node}'"))?;
        for issue in diag.warnings() {
            warn!("{}", issue);
        }

        let params = TechnologyParams::resolve(data)?;
        let mut tec = self.declare_variables(node, name, params);

        capex::add_cost_constraints(self.model, &mut tec, &data.economics)?;
        if tec.archetype().uses_input_size_constraint() {
            self.add_input_size_constraint(&tec);
        }
        archetype::constraints_for(&data.performance).add_constraints(
            self.model,
            &mut tec,
            self.time_steps,
        )?;

        for transformation in &tec.pending {
            self.model.require(*transformation);
        }
        debug!(
            node,
            technology = name,
            archetype = %tec.archetype(),
            pending = tec.pending.len(),
            "technology submodel built"
        );
        Ok(tec)
    }

    fn declare_variables(&mut self, node: &str, name: &str, params: TechnologyParams) -> TechnologyModel {
        let prefix = format!("{node}/{name}");
        let model = &mut *self.model;
        let steps = self.time_steps;

        let size = model.add_variable(
            VariableDef::continuous(format!("{prefix}/size"))
                .bounds(params.size_min, params.size_max)
                .integer_if(params.size_is_integer),
        );

        let mut flows = |side: &str, carriers: &[String], upper: f64| {
            carriers
                .iter()
                .map(|carrier| {
                    let vars: Vec<VarId> = (1..=steps)
                        .map(|t| {
                            model.add_variable(
                                VariableDef::non_negative(format!("{prefix}/{side}[{carrier},{t}]"))
                                    .max(upper),
                            )
                        })
                        .collect();
                    (carrier.clone(), vars)
                })
                .collect::<BTreeMap<_, _>>()
        };
        let inputs = flows("input", &params.input_carriers, params.size_max);
        let outputs = flows("output", &params.output_carriers, params.output_max);

        let capex = model.add_variable(VariableDef::non_negative(format!("{prefix}/capex")));
        let opex_variable = (1..=steps)
            .map(|t| model.add_variable(VariableDef::non_negative(format!("{prefix}/opex_variable[{t}]"))))
            .collect();
        let opex_fixed = model.add_variable(VariableDef::non_negative(format!("{prefix}/opex_fixed")));

        TechnologyModel {
            node: node.to_string(),
            name: name.to_string(),
            params,
            size,
            inputs,
            outputs,
            capex,
            opex_variable,
            opex_fixed,
            storage_level: Vec::new(),
            pending: BTreeSet::new(),
        }
    }

    fn add_input_size_constraint(&mut self, tec: &TechnologyModel) {
        let prefix = tec.prefix();
        for t in 0..self.time_steps {
            self.model.add_le(
                format!("{prefix}/size_limit[{}]", t + 1),
                tec.total_input(t),
                tec.size,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{boiler, heat_pump, pv};
    use ehub_core::{Breakpoint, Economics, SizeBound};

    fn carriers() -> Vec<String> {
        ["electricity", "heat", "gas"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_series_bounds_resolved() {
        let mut data = boiler();
        data.size_min = SizeBound::Series(vec![3.0, 1.0, 2.0]);
        data.size_max = SizeBound::Series(vec![8.0, 12.0]);
        let params = TechnologyParams::resolve(&data).unwrap();
        assert_eq!(params.size_min, 1.0);
        assert_eq!(params.size_max, 12.0);
        assert_eq!(params.output_max, 12.0);
    }

    #[test]
    fn test_res_has_no_input_variables() {
        let mut model = MilpModel::new();
        let carriers = carriers();
        let tec = TechnologyBuilder::new(&mut model, &carriers, 2)
            .build("city", "PV", &pv(vec![0.5, 0.8], 10.0))
            .unwrap();

        assert!(tec.inputs.is_empty());
        assert_eq!(tec.outputs["electricity"].len(), 2);
        assert!(model.find_variable("city/PV/input[electricity,1]").is_none());
        assert!(model.find_constraint("city/PV/size_limit[1]").is_none());
    }

    #[test]
    fn test_variables_only_for_declared_carriers() {
        let mut model = MilpModel::new();
        let carriers = carriers();
        let tec = TechnologyBuilder::new(&mut model, &carriers, 3)
            .build("city", "HP", &heat_pump())
            .unwrap();

        assert_eq!(tec.inputs.keys().collect::<Vec<_>>(), vec!["electricity"]);
        assert_eq!(tec.outputs.keys().collect::<Vec<_>>(), vec!["heat"]);
        assert!(tec.input("gas", 0).is_none());
        assert!(model.find_constraint("city/HP/size_limit[3]").is_some());
    }

    #[test]
    fn test_cost_variables_are_non_negative() {
        let mut model = MilpModel::new();
        let carriers = carriers();
        let tec = TechnologyBuilder::new(&mut model, &carriers, 2)
            .build("city", "boiler", &boiler())
            .unwrap();
        let cost_vars = [tec.capex, tec.opex_fixed]
            .into_iter()
            .chain(tec.opex_variable.iter().copied());
        for var in cost_vars {
            assert_eq!(model.variable(var).lower, Some(0.0), "{}", model.variable(var).name);
        }
    }

    #[test]
    fn test_negative_variable_opex_rejected() {
        let mut model = MilpModel::new();
        let carriers = carriers();
        let mut data = pv(vec![0.5, 0.8], 10.0);
        data.economics.opex_variable = -50.0;
        let err = TechnologyBuilder::new(&mut model, &carriers, 2)
            .build("city", "PV", &data)
            .unwrap_err();
        assert!(err.to_string().contains("opex_variable must be non-negative"));
        assert_eq!(model.stats().variables, 0);
    }

    #[test]
    fn test_integer_sizing_domain() {
        let mut model = MilpModel::new();
        let carriers = carriers();
        let mut data = boiler();
        data.size_is_integer = true;
        let tec = TechnologyBuilder::new(&mut model, &carriers, 1)
            .build("city", "boiler", &data)
            .unwrap();
        assert_eq!(
            model.variable(tec.size).domain,
            crate::problem::Domain::Integer
        );
    }

    #[test]
    fn test_invalid_technology_reports_all_issues() {
        let mut model = MilpModel::new();
        let carriers = carriers();
        let mut data = boiler();
        data.size_min = SizeBound::Scalar(50.0);
        data.output_carriers = vec!["steam".into()];
        let err = TechnologyBuilder::new(&mut model, &carriers, 1)
            .build("city", "boiler", &data)
            .unwrap_err();
        match err {
            HubError::Validation { entity, issues } => {
                assert!(entity.contains("'boiler'") && entity.contains("'city'"));
                assert!(issues.iter().any(|i| i.contains("size_min")));
                assert!(issues.iter().any(|i| i.contains("'steam'")));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_piecewise_sets_pending_flag() {
        let mut model = MilpModel::new();
        let carriers = carriers();
        let mut data = boiler();
        data.economics = Economics::piecewise(
            vec![
                Breakpoint::new(0.0, 0.0),
                Breakpoint::new(10.0, 800.0),
                Breakpoint::new(20.0, 1400.0),
            ],
            1.0,
            0.02,
        );
        let tec = TechnologyBuilder::new(&mut model, &carriers, 1)
            .build("city", "boiler", &data)
            .unwrap();
        assert!(tec.pending.contains(&Transformation::BigM));
        assert!(model.requires(Transformation::BigM));
        assert_eq!(model.disjunctions().len(), 1);
    }
}
