//! Solver-neutral MILP representation
//!
//! The energy hub is assembled into a [`MilpModel`] rather than directly into
//! a solver's problem type. This keeps construction free of solver state, lets
//! the finished model be snapshotted, and allows any candidate assignment to
//! be checked against the formulation ([`MilpModel::check`]).
//!
//! ```text
//! minimize    c·x
//! subject to  a_i·x (≤ | ≥ | =) b_i            named constraint rows
//!             ∨_k { rows of disjunct k }         exactly-one-of groups
//!             l ≤ x ≤ u,  x_j ∈ ℤ or {0,1}
//! ```
//!
//! Disjunctions cannot be handed to a solver; the big-M pass in
//! [`crate::transform`] rewrites them into binaries and relaxed rows.

mod evaluate;
mod expr;

pub use evaluate::Violation;
pub use expr::{Domain, LinearExpr, VarId, VariableDef};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Constraint sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "=")]
    Eq,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "=",
        })
    }
}

/// A named row `lhs (sense) rhs`. The constant part of the left-hand side is
/// always folded into `rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub lhs: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    /// Build `left (sense) right`, moving every variable to the left.
    pub fn new(
        name: impl Into<String>,
        left: impl Into<LinearExpr>,
        sense: Sense,
        right: impl Into<LinearExpr>,
    ) -> Self {
        let mut lhs = left.into() - right.into();
        let rhs = -lhs.constant;
        lhs.constant = 0.0;
        Self {
            name: name.into(),
            lhs,
            sense,
            rhs,
        }
    }

    pub fn le(name: impl Into<String>, left: impl Into<LinearExpr>, right: impl Into<LinearExpr>) -> Self {
        Self::new(name, left, Sense::Le, right)
    }

    pub fn ge(name: impl Into<String>, left: impl Into<LinearExpr>, right: impl Into<LinearExpr>) -> Self {
        Self::new(name, left, Sense::Ge, right)
    }

    pub fn eq(name: impl Into<String>, left: impl Into<LinearExpr>, right: impl Into<LinearExpr>) -> Self {
        Self::new(name, left, Sense::Eq, right)
    }
}

/// Exactly one of `disjuncts` must hold; each disjunct is a conjunction of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disjunction {
    pub name: String,
    pub disjuncts: Vec<Vec<Constraint>>,
}

/// Model-wide rewrite that must run before the model can be solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transformation {
    /// Replace disjunctions by binaries and big-M relaxed rows
    BigM,
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transformation::BigM => f.write_str("big-M"),
        }
    }
}

/// Assembled MILP (minimisation).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MilpModel {
    variables: Vec<VariableDef>,
    constraints: Vec<Constraint>,
    #[serde(default)]
    disjunctions: Vec<Disjunction>,
    objective: LinearExpr,
    #[serde(default)]
    pending: BTreeSet<Transformation>,
    #[serde(default)]
    applied: BTreeSet<Transformation>,
}

impl MilpModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, def: VariableDef) -> VarId {
        self.variables.push(def);
        VarId(self.variables.len() - 1)
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn add_eq(&mut self, name: impl Into<String>, left: impl Into<LinearExpr>, right: impl Into<LinearExpr>) {
        self.add_constraint(Constraint::eq(name, left, right));
    }

    pub fn add_le(&mut self, name: impl Into<String>, left: impl Into<LinearExpr>, right: impl Into<LinearExpr>) {
        self.add_constraint(Constraint::le(name, left, right));
    }

    pub fn add_ge(&mut self, name: impl Into<String>, left: impl Into<LinearExpr>, right: impl Into<LinearExpr>) {
        self.add_constraint(Constraint::ge(name, left, right));
    }

    pub fn add_disjunction(&mut self, disjunction: Disjunction) {
        self.disjunctions.push(disjunction);
    }

    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    /// Record that `transformation` must run before solving.
    pub fn require(&mut self, transformation: Transformation) {
        if !self.applied.contains(&transformation) {
            self.pending.insert(transformation);
        }
    }

    pub(crate) fn mark_applied(&mut self, transformation: Transformation) {
        self.pending.remove(&transformation);
        self.applied.insert(transformation);
    }

    pub(crate) fn take_disjunctions(&mut self) -> Vec<Disjunction> {
        std::mem::take(&mut self.disjunctions)
    }

    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    pub fn variable(&self, var: VarId) -> &VariableDef {
        &self.variables[var.0]
    }

    pub(crate) fn variable_mut(&mut self, var: VarId) -> &mut VariableDef {
        &mut self.variables[var.0]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn disjunctions(&self) -> &[Disjunction] {
        &self.disjunctions
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn pending(&self) -> &BTreeSet<Transformation> {
        &self.pending
    }

    pub fn applied(&self) -> &BTreeSet<Transformation> {
        &self.applied
    }

    pub fn requires(&self, transformation: Transformation) -> bool {
        self.pending.contains(&transformation)
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn find_constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn find_variable(&self, name: &str) -> Option<VarId> {
        self.variables
            .iter()
            .position(|v| v.name == name)
            .map(VarId)
    }

    pub fn has_integer_variables(&self) -> bool {
        self.variables
            .iter()
            .any(|v| v.domain != Domain::Continuous)
    }

    /// Interval spanned by `expr` under the variable bounds; `None` on a side
    /// that is unbounded.
    pub fn expr_range(&self, expr: &LinearExpr) -> (Option<f64>, Option<f64>) {
        let mut low = Some(expr.constant);
        let mut high = Some(expr.constant);
        for (var, coef) in &expr.normalized().terms {
            let def = self.variable(*var);
            let (at_low, at_high) = if *coef >= 0.0 {
                (def.lower, def.upper)
            } else {
                (def.upper, def.lower)
            };
            low = low.zip(at_low).map(|(acc, b)| acc + coef * b);
            high = high.zip(at_high).map(|(acc, b)| acc + coef * b);
        }
        (low, high)
    }

    pub fn stats(&self) -> ModelStats {
        let count = |domain: Domain| {
            self.variables
                .iter()
                .filter(|v| v.domain == domain)
                .count()
        };
        ModelStats {
            variables: self.variables.len(),
            continuous: count(Domain::Continuous),
            integer: count(Domain::Integer),
            binary: count(Domain::Binary),
            constraints: self.constraints.len(),
            disjunctions: self.disjunctions.len(),
            pending: self.pending.iter().copied().collect(),
        }
    }
}

/// Size summary of a [`MilpModel`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStats {
    pub variables: usize,
    pub continuous: usize,
    pub integer: usize,
    pub binary: usize,
    pub constraints: usize,
    pub disjunctions: usize,
    pub pending: Vec<Transformation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_folds_constants() {
        let x = VarId(0);
        let c = Constraint::le("cap", 2.0 * x + 1.0, LinearExpr::constant(5.0));
        assert_eq!(c.rhs, 4.0);
        assert_eq!(c.lhs.constant, 0.0);
        assert_eq!(c.lhs.coefficient(x), 2.0);
    }

    #[test]
    fn test_right_hand_variables_move_left() {
        let x = VarId(0);
        let y = VarId(1);
        let c = Constraint::eq("link", x, 3.0 * y);
        assert_eq!(c.lhs.coefficient(x), 1.0);
        assert_eq!(c.lhs.coefficient(y), -3.0);
        assert_eq!(c.rhs, 0.0);
    }

    #[test]
    fn test_expr_range_uses_bounds() {
        let mut model = MilpModel::new();
        let x = model.add_variable(VariableDef::continuous("x").bounds(0.0, 10.0));
        let y = model.add_variable(VariableDef::continuous("y").bounds(1.0, 2.0));
        let z = model.add_variable(VariableDef::non_negative("z"));

        assert_eq!(model.expr_range(&(x - 2.0 * y)), (Some(-4.0), Some(8.0)));
        assert_eq!(model.expr_range(&(x + z)), (Some(0.0), None));
    }

    #[test]
    fn test_pending_transformation_lifecycle() {
        let mut model = MilpModel::new();
        assert!(!model.requires(Transformation::BigM));
        model.require(Transformation::BigM);
        assert!(model.requires(Transformation::BigM));

        model.mark_applied(Transformation::BigM);
        assert!(!model.requires(Transformation::BigM));
        model.require(Transformation::BigM);
        assert!(model.pending().is_empty());
        assert!(model.applied().contains(&Transformation::BigM));
    }

    #[test]
    fn test_stats_count_domains() {
        let mut model = MilpModel::new();
        model.add_variable(VariableDef::non_negative("a"));
        model.add_variable(VariableDef::non_negative("n").integer_if(true));
        model.add_variable(VariableDef::binary("b"));
        let stats = model.stats();
        assert_eq!((stats.continuous, stats.integer, stats.binary), (1, 1, 1));
        assert!(model.has_integer_variables());
        assert_eq!(model.find_variable("n"), Some(VarId(1)));
    }
}
