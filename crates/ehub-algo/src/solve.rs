//! Bridge from [`MilpModel`] to `good_lp` solvers.
//!
//! Clarabel (pure Rust, always available) handles continuous models only;
//! integer sizing and big-M binaries need HiGHS (`solver-highs` feature).

use crate::problem::{Domain, LinearExpr, MilpModel, Sense};
use ehub_core::{HubError, HubResult};
use good_lp::solvers::clarabel::clarabel;
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;
use tracing::info;

/// Available MILP/LP backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    #[default]
    Clarabel,
    #[cfg(feature = "solver-highs")]
    Highs,
}

const AVAILABLE_SOLVERS: &[&str] = &[
    "clarabel",
    #[cfg(feature = "solver-highs")]
    "highs",
];

impl SolverKind {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_SOLVERS
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolverKind::Clarabel => "clarabel",
            #[cfg(feature = "solver-highs")]
            SolverKind::Highs => "highs",
        }
    }

    pub fn supports_integers(&self) -> bool {
        match self {
            SolverKind::Clarabel => false,
            #[cfg(feature = "solver-highs")]
            SolverKind::Highs => true,
        }
    }
}

impl std::fmt::Display for SolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolverKind {
    type Err = HubError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "clarabel" => Ok(SolverKind::Clarabel),
            #[cfg(feature = "solver-highs")]
            "highs" => Ok(SolverKind::Highs),
            other => Err(HubError::Config(format!(
                "unknown solver '{}'; supported values: {}",
                other,
                SolverKind::available().join(", ")
            ))),
        }
    }
}

/// Outcome reported by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
        })
    }
}

/// Solver-assigned values of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubSolution {
    pub status: SolveStatus,
    pub solver: SolverKind,
    /// Objective value; `None` unless optimal
    pub objective: Option<f64>,
    /// Value per variable, indexed by `VarId`; empty unless optimal
    pub values: Vec<f64>,
    pub solve_time_ms: u128,
}

impl HubSolution {
    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    pub fn value(&self, var: crate::problem::VarId) -> Option<f64> {
        self.values.get(var.index()).copied()
    }

    pub fn evaluate(&self, expr: &LinearExpr) -> Option<f64> {
        self.is_optimal().then(|| expr.evaluate(&self.values))
    }
}

/// Solve `model` with `kind`.
///
/// The model must be free of disjunctions (run the big-M pass first).
/// Infeasible and unbounded outcomes are statuses, not errors.
pub fn solve_model(model: &MilpModel, kind: SolverKind) -> HubResult<HubSolution> {
    let start = Instant::now();

    if !model.disjunctions().is_empty() || !model.pending().is_empty() {
        return Err(HubError::Solver(format!(
            "model has {} untransformed disjunction(s); apply the big-M transformation first",
            model.disjunctions().len()
        )));
    }
    if model.has_integer_variables() && !kind.supports_integers() {
        return Err(HubError::Solver(format!(
            "{} cannot solve models with integer or binary variables; available solvers: {}",
            kind,
            SolverKind::available().join(", ")
        )));
    }

    let mut vars = ProblemVariables::new();
    let lp_vars: Vec<Variable> = model
        .variables()
        .iter()
        .map(|def| {
            let mut v = variable().name(def.name.clone());
            if let Some(lo) = def.lower {
                v = v.min(lo);
            }
            if let Some(hi) = def.upper {
                v = v.max(hi);
            }
            match def.domain {
                Domain::Continuous => vars.add(v),
                Domain::Integer => vars.add(v.integer()),
                Domain::Binary => vars.add(v.binary()),
            }
        })
        .collect();

    let objective = to_expression(model.objective(), &lp_vars);
    let rows: Vec<good_lp::Constraint> = model
        .constraints()
        .iter()
        .map(|c| {
            let lhs = to_expression(&c.lhs, &lp_vars);
            let rhs = c.rhs;
            match c.sense {
                Sense::Le => constraint!(lhs <= rhs),
                Sense::Ge => constraint!(lhs >= rhs),
                Sense::Eq => constraint!(lhs == rhs),
            }
        })
        .collect();

    let (status, values) = match kind {
        SolverKind::Clarabel => run(vars.minimise(objective).using(clarabel), rows, &lp_vars)?,
        #[cfg(feature = "solver-highs")]
        SolverKind::Highs => run(
            vars.minimise(objective).using(good_lp::solvers::highs::highs),
            rows,
            &lp_vars,
        )?,
    };

    let solution = HubSolution {
        status,
        solver: kind,
        objective: (status == SolveStatus::Optimal).then(|| model.objective_value(&values)),
        values,
        solve_time_ms: start.elapsed().as_millis(),
    };
    info!(
        solver = %kind,
        status = %solution.status,
        objective = ?solution.objective,
        ms = solution.solve_time_ms,
        "solve finished"
    );
    Ok(solution)
}

fn to_expression(expr: &LinearExpr, lp_vars: &[Variable]) -> Expression {
    let mut out = Expression::from(expr.constant);
    for (var, coef) in &expr.normalized().terms {
        out += *coef * lp_vars[var.index()];
    }
    out
}

/// Add the rows and solve; values are empty unless optimal.
fn run<M>(
    mut problem: M,
    rows: Vec<good_lp::Constraint>,
    lp_vars: &[Variable],
) -> HubResult<(SolveStatus, Vec<f64>)>
where
    M: SolverModel<Error = ResolutionError>,
{
    for row in rows {
        problem = problem.with(row);
    }
    match problem.solve() {
        Ok(solution) => Ok((
            SolveStatus::Optimal,
            lp_vars.iter().map(|v| solution.value(*v)).collect(),
        )),
        Err(ResolutionError::Infeasible) => Ok((SolveStatus::Infeasible, Vec::new())),
        Err(ResolutionError::Unbounded) => Ok((SolveStatus::Unbounded, Vec::new())),
        Err(e) => Err(HubError::Solver(e.to_string())),
    }
}
