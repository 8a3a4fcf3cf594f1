//! Checking an assignment against the model.

use super::{Constraint, Domain, MilpModel, Sense};
use serde::Serialize;
use std::fmt;

/// One way an assignment fails the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    Constraint { name: String, residual: f64 },
    Bound { variable: String, value: f64 },
    Integrality { variable: String, value: f64 },
    /// No disjunct of the named disjunction holds
    Disjunction { name: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Constraint { name, residual } => {
                write!(f, "constraint '{name}' violated by {residual:.3e}")
            }
            Violation::Bound { variable, value } => {
                write!(f, "variable '{variable}' = {value} is outside its bounds")
            }
            Violation::Integrality { variable, value } => {
                write!(f, "variable '{variable}' = {value} is not integral")
            }
            Violation::Disjunction { name } => {
                write!(f, "no disjunct of '{name}' holds")
            }
        }
    }
}

impl Constraint {
    /// Amount by which `values` violate this row (0 when satisfied).
    pub fn residual(&self, values: &[f64]) -> f64 {
        let lhs = self.lhs.evaluate(values);
        match self.sense {
            Sense::Le => (lhs - self.rhs).max(0.0),
            Sense::Ge => (self.rhs - lhs).max(0.0),
            Sense::Eq => (lhs - self.rhs).abs(),
        }
    }

    pub fn is_satisfied(&self, values: &[f64], tol: f64) -> bool {
        self.residual(values) <= tol * (1.0 + self.rhs.abs())
    }
}

impl MilpModel {
    /// Every violation of `values` (indexed by variable) against rows,
    /// bounds, integrality and disjunctions, with relative tolerance `tol`.
    pub fn check(&self, values: &[f64], tol: f64) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (index, def) in self.variables().iter().enumerate() {
            let value = values.get(index).copied().unwrap_or(0.0);
            let below = def.lower.is_some_and(|lo| value < lo - tol * (1.0 + lo.abs()));
            let above = def.upper.is_some_and(|hi| value > hi + tol * (1.0 + hi.abs()));
            if below || above {
                violations.push(Violation::Bound {
                    variable: def.name.clone(),
                    value,
                });
            }
            if def.domain != Domain::Continuous && (value - value.round()).abs() > tol {
                violations.push(Violation::Integrality {
                    variable: def.name.clone(),
                    value,
                });
            }
        }

        for row in self.constraints() {
            if !row.is_satisfied(values, tol) {
                violations.push(Violation::Constraint {
                    name: row.name.clone(),
                    residual: row.residual(values),
                });
            }
        }

        for disjunction in self.disjunctions() {
            let holds = disjunction
                .disjuncts
                .iter()
                .any(|rows| rows.iter().all(|row| row.is_satisfied(values, tol)));
            if !holds {
                violations.push(Violation::Disjunction {
                    name: disjunction.name.clone(),
                });
            }
        }

        violations
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective().evaluate(values)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Disjunction, LinearExpr, VariableDef};
    use super::*;

    #[test]
    fn test_feasible_assignment_has_no_violations() {
        let mut model = MilpModel::new();
        let x = model.add_variable(VariableDef::continuous("x").bounds(0.0, 4.0));
        let y = model.add_variable(VariableDef::non_negative("y").integer_if(true));
        model.add_le("sum", x + y, 5.0);

        assert!(model.check(&[2.5, 2.0], 1e-9).is_empty());
    }

    #[test]
    fn test_violations_are_reported_by_kind() {
        let mut model = MilpModel::new();
        let x = model.add_variable(VariableDef::continuous("x").bounds(0.0, 4.0));
        let y = model.add_variable(VariableDef::non_negative("y").integer_if(true));
        model.add_eq("link", x, LinearExpr::from(y));

        let violations = model.check(&[5.0, 1.5], 1e-9);
        assert_eq!(violations.len(), 3);
        assert!(matches!(violations[0], Violation::Bound { .. }));
        assert!(matches!(violations[1], Violation::Integrality { .. }));
        match &violations[2] {
            Violation::Constraint { name, residual } => {
                assert_eq!(name, "link");
                assert!((residual - 3.5).abs() < 1e-12);
            }
            other => panic!("unexpected violation {other}"),
        }
    }

    #[test]
    fn test_disjunction_needs_one_disjunct() {
        let mut model = MilpModel::new();
        let x = model.add_variable(VariableDef::continuous("x").bounds(0.0, 10.0));
        model.add_disjunction(Disjunction {
            name: "segment".into(),
            disjuncts: vec![
                vec![Constraint::le("low", x, 2.0)],
                vec![Constraint::ge("high", x, 8.0)],
            ],
        });

        assert!(model.check(&[1.0], 1e-9).is_empty());
        assert!(model.check(&[9.0], 1e-9).is_empty());
        assert_eq!(
            model.check(&[5.0], 1e-9),
            vec![Violation::Disjunction {
                name: "segment".into()
            }]
        );
    }
}
