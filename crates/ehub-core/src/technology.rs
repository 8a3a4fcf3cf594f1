//! Technology input data: archetype-tagged performance data, economics and
//! size bounds.
//!
//! The archetype set is closed. Deserialising a technology whose `tec_type`
//! is not one of `RES`, `CONV1`, `CONV2`, `CONV3`, `STOR` fails with a parse
//! error naming the expected tags.

use crate::diagnostics::Diagnostics;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Technology behaviour class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Archetype {
    /// Renewable generation driven by a capacity-factor series
    #[serde(rename = "RES")]
    Res,
    /// n inputs -> n outputs, pooled conversion (fuel and output substitution)
    #[serde(rename = "CONV1")]
    Conv1,
    /// n inputs -> n outputs, each output tied to total input (fuel substitution)
    #[serde(rename = "CONV2")]
    Conv2,
    /// 1 input -> n flexible outputs, linear performance
    #[serde(rename = "CONV3")]
    Conv3,
    /// Storage (1 input -> 1 output)
    #[serde(rename = "STOR")]
    Stor,
}

impl Archetype {
    pub const ALL: [Archetype; 5] = [
        Archetype::Res,
        Archetype::Conv1,
        Archetype::Conv2,
        Archetype::Conv3,
        Archetype::Stor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Archetype::Res => "RES",
            Archetype::Conv1 => "CONV1",
            Archetype::Conv2 => "CONV2",
            Archetype::Conv3 => "CONV3",
            Archetype::Stor => "STOR",
        }
    }

    /// Whether the technology has controllable input flows.
    ///
    /// Renewable technologies have none, so no input variable is ever created
    /// for them.
    pub fn has_input(&self) -> bool {
        !matches!(self, Archetype::Res)
    }

    /// Whether the input-rated size constraint `Σ input ≤ size` applies.
    ///
    /// Renewables are sized through their capacity factor and storage carries
    /// its own power/energy size constraints.
    pub fn uses_input_size_constraint(&self) -> bool {
        matches!(
            self,
            Archetype::Conv1 | Archetype::Conv2 | Archetype::Conv3
        )
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Archetype {
    type Err = crate::HubError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Archetype::ALL
            .iter()
            .copied()
            .find(|a| a.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| {
                crate::HubError::Config(format!(
                    "unknown technology archetype '{}'; expected one of {}",
                    value,
                    Archetype::ALL.map(|a| a.as_str()).join(", ")
                ))
            })
    }
}

/// A size bound given either as one number or as a series.
///
/// A series is coarsened into a single design bound: the minimum of the
/// series for `size_min`, the maximum for `size_max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeBound {
    Scalar(f64),
    Series(Vec<f64>),
}

impl SizeBound {
    /// Resolve as a lower bound. `None` for an empty series.
    pub fn resolve_min(&self) -> Option<f64> {
        match self {
            SizeBound::Scalar(v) => Some(*v),
            SizeBound::Series(values) => values.iter().copied().reduce(f64::min),
        }
    }

    /// Resolve as an upper bound. `None` for an empty series.
    pub fn resolve_max(&self) -> Option<f64> {
        match self {
            SizeBound::Scalar(v) => Some(*v),
            SizeBound::Series(values) => values.iter().copied().reduce(f64::max),
        }
    }

    fn values(&self) -> &[f64] {
        match self {
            SizeBound::Scalar(v) => std::slice::from_ref(v),
            SizeBound::Series(values) => values,
        }
    }
}

impl From<f64> for SizeBound {
    fn from(value: f64) -> Self {
        SizeBound::Scalar(value)
    }
}

/// CAPEX cost-curve selector (`1` = linear, `2` = piecewise linear).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CapexModel {
    Linear,
    PiecewiseLinear,
}

impl TryFrom<u8> for CapexModel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CapexModel::Linear),
            2 => Ok(CapexModel::PiecewiseLinear),
            other => Err(format!(
                "unknown CAPEX model {other}; expected 1 (linear) or 2 (piecewise linear)"
            )),
        }
    }
}

impl From<CapexModel> for u8 {
    fn from(model: CapexModel) -> Self {
        match model {
            CapexModel::Linear => 1,
            CapexModel::PiecewiseLinear => 2,
        }
    }
}

/// One point of a piecewise-linear CAPEX curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub size: f64,
    pub capex: f64,
}

impl Breakpoint {
    pub fn new(size: f64, capex: f64) -> Self {
        Self { size, capex }
    }
}

/// Economic parameters of a technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Economics {
    pub capex_model: CapexModel,
    /// Annualised CAPEX per unit of size (EUR/MW, or EUR/unit for integer sizing)
    pub unit_capex: f64,
    /// Variable OPEX per MWh of output (EUR/MWh)
    pub opex_variable: f64,
    /// Fixed OPEX as a fraction of CAPEX
    pub opex_fixed: f64,
    /// Breakpoints of the piecewise-linear CAPEX curve
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capex_breakpoints: Vec<Breakpoint>,
}

impl Economics {
    pub fn linear(unit_capex: f64, opex_variable: f64, opex_fixed: f64) -> Self {
        Self {
            capex_model: CapexModel::Linear,
            unit_capex,
            opex_variable,
            opex_fixed,
            capex_breakpoints: Vec::new(),
        }
    }

    pub fn piecewise(breakpoints: Vec<Breakpoint>, opex_variable: f64, opex_fixed: f64) -> Self {
        Self {
            capex_model: CapexModel::PiecewiseLinear,
            unit_capex: 0.0,
            opex_variable,
            opex_fixed,
            capex_breakpoints: breakpoints,
        }
    }

    fn validate_into(&self, size_range: Option<(f64, f64)>, entity: &str, diag: &mut Diagnostics) {
        for (label, value) in [
            ("unit_capex", self.unit_capex),
            ("opex_variable", self.opex_variable),
            ("opex_fixed", self.opex_fixed),
        ] {
            if !value.is_finite() {
                diag.add_error_with_entity("economics", &format!("{label} is not finite"), entity);
            } else if value < 0.0 {
                diag.add_error_with_entity(
                    "economics",
                    &format!("{label} must be non-negative, got {value}"),
                    entity,
                );
            }
        }

        match self.capex_model {
            CapexModel::Linear => {
                if !self.capex_breakpoints.is_empty() {
                    diag.add_warning_with_entity(
                        "economics",
                        "capex_breakpoints are ignored for the linear CAPEX model",
                        entity,
                    );
                }
            }
            CapexModel::PiecewiseLinear => {
                validate_breakpoints(&self.capex_breakpoints, size_range, entity, diag)
            }
        }
    }
}

fn validate_breakpoints(
    points: &[Breakpoint],
    size_range: Option<(f64, f64)>,
    entity: &str,
    diag: &mut Diagnostics,
) {
    if points.len() < 2 {
        diag.add_error_with_entity(
            "economics",
            &format!(
                "piecewise CAPEX needs at least 2 breakpoints, got {}",
                points.len()
            ),
            entity,
        );
        return;
    }
    if points
        .iter()
        .any(|p| !p.size.is_finite() || !p.capex.is_finite())
    {
        diag.add_error_with_entity("economics", "breakpoints must be finite", entity);
        return;
    }
    if points[0].capex < 0.0 {
        diag.add_error_with_entity(
            "economics",
            &format!("breakpoint CAPEX must be non-negative, got {}", points[0].capex),
            entity,
        );
    }
    for pair in points.windows(2) {
        if pair[1].size <= pair[0].size {
            diag.add_error_with_entity(
                "economics",
                &format!(
                    "breakpoint sizes must be strictly increasing ({} then {})",
                    pair[0].size, pair[1].size
                ),
                entity,
            );
        }
        if pair[1].capex < pair[0].capex {
            diag.add_error_with_entity(
                "economics",
                &format!(
                    "piecewise CAPEX must be monotone ({} then {})",
                    pair[0].capex, pair[1].capex
                ),
                entity,
            );
        }
    }
    if let Some((size_min, size_max)) = size_range {
        let first = points[0].size;
        let last = points[points.len() - 1].size;
        if first > size_min || last < size_max {
            diag.add_error_with_entity(
                "economics",
                &format!(
                    "breakpoints cover [{first}, {last}] but the size range is [{size_min}, {size_max}]"
                ),
                entity,
            );
        }
    }
}

/// Performance data of a renewable technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenewablePerformance {
    /// Capacity factor per time step, in [0, 1]
    pub capacity_factor: Vec<f64>,
}

/// Performance data of the conversion archetypes.
///
/// `efficiency` is keyed by input carrier for CONV1 and by output carrier for
/// CONV2 and CONV3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionPerformance {
    pub efficiency: BTreeMap<String, f64>,
}

/// How the storage level at the first time step is linked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum StorageCycle {
    /// The level before step 1 equals the level at step T
    #[default]
    Cyclic,
    /// The level before step 1 is a fixed fraction of the installed size
    Anchored { initial_fraction: f64 },
}

fn default_rate() -> f64 {
    1.0
}

/// Performance data of a storage technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoragePerformance {
    pub charge_efficiency: f64,
    pub discharge_efficiency: f64,
    /// Fraction of the stored energy lost per time step
    #[serde(default)]
    pub self_discharge: f64,
    /// Maximum charging power per unit of energy capacity
    #[serde(default = "default_rate")]
    pub charge_rate: f64,
    /// Maximum discharging power per unit of energy capacity
    #[serde(default = "default_rate")]
    pub discharge_rate: f64,
    #[serde(default)]
    pub cycle: StorageCycle,
}

impl StoragePerformance {
    pub fn new(charge_efficiency: f64, discharge_efficiency: f64) -> Self {
        Self {
            charge_efficiency,
            discharge_efficiency,
            self_discharge: 0.0,
            charge_rate: 1.0,
            discharge_rate: 1.0,
            cycle: StorageCycle::Cyclic,
        }
    }
}

/// Archetype tag together with the performance data that archetype needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tec_type")]
pub enum Performance {
    #[serde(rename = "RES")]
    Res(RenewablePerformance),
    #[serde(rename = "CONV1")]
    Conv1(ConversionPerformance),
    #[serde(rename = "CONV2")]
    Conv2(ConversionPerformance),
    #[serde(rename = "CONV3")]
    Conv3(ConversionPerformance),
    #[serde(rename = "STOR")]
    Stor(StoragePerformance),
}

impl Performance {
    pub fn archetype(&self) -> Archetype {
        match self {
            Performance::Res(_) => Archetype::Res,
            Performance::Conv1(_) => Archetype::Conv1,
            Performance::Conv2(_) => Archetype::Conv2,
            Performance::Conv3(_) => Archetype::Conv3,
            Performance::Stor(_) => Archetype::Stor,
        }
    }

    fn validate_into(
        &self,
        tec: &TechnologyData,
        time_steps: usize,
        entity: &str,
        diag: &mut Diagnostics,
    ) {
        let inputs = tec.input_carriers.len();
        let outputs = tec.output_carriers.len();
        let mut arity = |ok: bool, message: &str| {
            if !ok {
                diag.add_error_with_entity("archetype", message, entity);
            }
        };

        match self {
            Performance::Res(perf) => {
                arity(inputs == 0, "RES technologies take no input carriers");
                arity(outputs == 1, "RES technologies need exactly one output carrier");
                if perf.capacity_factor.len() != time_steps {
                    diag.add_error_with_entity(
                        "performance",
                        &format!(
                            "capacity_factor has {} values but the horizon has {} time steps",
                            perf.capacity_factor.len(),
                            time_steps
                        ),
                        entity,
                    );
                }
                if perf
                    .capacity_factor
                    .iter()
                    .any(|cf| !cf.is_finite() || !(0.0..=1.0).contains(cf))
                {
                    diag.add_error_with_entity(
                        "performance",
                        "capacity_factor values must lie in [0, 1]",
                        entity,
                    );
                }
            }
            Performance::Conv1(perf) => {
                arity(inputs >= 1, "CONV1 technologies need at least one input carrier");
                arity(outputs >= 1, "CONV1 technologies need at least one output carrier");
                validate_efficiency(&perf.efficiency, &tec.input_carriers, "input", entity, diag);
            }
            Performance::Conv2(perf) => {
                arity(inputs >= 1, "CONV2 technologies need at least one input carrier");
                arity(outputs >= 1, "CONV2 technologies need at least one output carrier");
                validate_efficiency(&perf.efficiency, &tec.output_carriers, "output", entity, diag);
            }
            Performance::Conv3(perf) => {
                arity(inputs == 1, "CONV3 technologies need exactly one input carrier");
                arity(outputs >= 1, "CONV3 technologies need at least one output carrier");
                validate_efficiency(&perf.efficiency, &tec.output_carriers, "output", entity, diag);
            }
            Performance::Stor(perf) => {
                arity(inputs == 1, "STOR technologies need exactly one input carrier");
                arity(outputs == 1, "STOR technologies need exactly one output carrier");
                if inputs == 1 && outputs == 1 && tec.input_carriers[0] != tec.output_carriers[0] {
                    diag.add_error_with_entity(
                        "archetype",
                        &format!(
                            "STOR stores one carrier but input is '{}' and output is '{}'",
                            tec.input_carriers[0], tec.output_carriers[0]
                        ),
                        entity,
                    );
                }
                for (label, value) in [
                    ("charge_efficiency", perf.charge_efficiency),
                    ("discharge_efficiency", perf.discharge_efficiency),
                ] {
                    if !(value > 0.0 && value <= 1.0) {
                        diag.add_error_with_entity(
                            "performance",
                            &format!("{label} must lie in (0, 1], got {value}"),
                            entity,
                        );
                    }
                }
                if !(0.0..1.0).contains(&perf.self_discharge) {
                    diag.add_error_with_entity(
                        "performance",
                        &format!("self_discharge must lie in [0, 1), got {}", perf.self_discharge),
                        entity,
                    );
                }
                for (label, value) in [
                    ("charge_rate", perf.charge_rate),
                    ("discharge_rate", perf.discharge_rate),
                ] {
                    if !(value.is_finite() && value > 0.0) {
                        diag.add_error_with_entity(
                            "performance",
                            &format!("{label} must be positive, got {value}"),
                            entity,
                        );
                    }
                }
                if let StorageCycle::Anchored { initial_fraction } = perf.cycle {
                    if !(0.0..=1.0).contains(&initial_fraction) {
                        diag.add_error_with_entity(
                            "performance",
                            &format!("initial_fraction must lie in [0, 1], got {initial_fraction}"),
                            entity,
                        );
                    }
                }
            }
        }
    }
}

fn validate_efficiency(
    efficiency: &BTreeMap<String, f64>,
    carriers: &[String],
    side: &str,
    entity: &str,
    diag: &mut Diagnostics,
) {
    let declared: BTreeSet<&str> = carriers.iter().map(String::as_str).collect();
    let keyed: BTreeSet<&str> = efficiency.keys().map(String::as_str).collect();

    for missing in declared.difference(&keyed) {
        diag.add_error_with_entity(
            "performance",
            &format!("no efficiency given for {side} carrier '{missing}'"),
            entity,
        );
    }
    for extra in keyed.difference(&declared) {
        diag.add_error_with_entity(
            "performance",
            &format!("efficiency given for '{extra}', which is not an {side} carrier"),
            entity,
        );
    }
    for (carrier, value) in efficiency {
        if !(value.is_finite() && *value > 0.0) {
            diag.add_error_with_entity(
                "performance",
                &format!("efficiency for '{carrier}' must be positive, got {value}"),
                entity,
            );
        }
    }
}

/// Raw technology-data bundle for one technology at one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyData {
    pub performance: Performance,
    pub economics: Economics,
    pub size_min: SizeBound,
    pub size_max: SizeBound,
    #[serde(default)]
    pub size_is_integer: bool,
    #[serde(default)]
    pub input_carriers: Vec<String>,
    #[serde(default)]
    pub output_carriers: Vec<String>,
}

impl TechnologyData {
    pub fn archetype(&self) -> Archetype {
        self.performance.archetype()
    }

    /// Resolved `(size_min, size_max)`; `None` when either series is empty.
    pub fn size_range(&self) -> Option<(f64, f64)> {
        Some((self.size_min.resolve_min()?, self.size_max.resolve_max()?))
    }

    /// Every issue with this technology, checked against the global carrier
    /// set and the horizon length.
    pub fn validate_into(
        &self,
        carriers: &[String],
        time_steps: usize,
        entity: &str,
        diag: &mut Diagnostics,
    ) {
        for (side, list) in [
            ("input", &self.input_carriers),
            ("output", &self.output_carriers),
        ] {
            let mut seen = BTreeSet::new();
            for carrier in list {
                if !carriers.contains(carrier) {
                    diag.add_error_with_entity(
                        "carrier",
                        &format!("{side} carrier '{carrier}' is not in the set of carriers"),
                        entity,
                    );
                }
                if !seen.insert(carrier.as_str()) {
                    diag.add_error_with_entity(
                        "carrier",
                        &format!("{side} carrier '{carrier}' is listed twice"),
                        entity,
                    );
                }
            }
        }

        for (label, bound) in [("size_min", &self.size_min), ("size_max", &self.size_max)] {
            if bound.values().is_empty() {
                diag.add_error_with_entity("size", &format!("{label} series is empty"), entity);
            } else if bound.values().iter().any(|v| !v.is_finite() || *v < 0.0) {
                diag.add_error_with_entity(
                    "size",
                    &format!("{label} values must be finite and non-negative"),
                    entity,
                );
            }
        }

        let size_range = self.size_range();
        if let Some((size_min, size_max)) = size_range {
            if size_min > size_max {
                diag.add_error_with_entity(
                    "size",
                    &format!("size_min {size_min} exceeds size_max {size_max}"),
                    entity,
                );
            }
        }

        self.economics.validate_into(size_range, entity, diag);
        self.performance
            .validate_into(self, time_steps, entity, diag);
    }
}
