//! Big-M reformulation of disjunctions
//!
//! Each disjunction `∨_k D_k` becomes
//!
//! ```text
//! Σ_k b_k = 1,                b_k ∈ {0, 1}
//! a·x ≤ r + M (1 − b_k)       for every row a·x ≤ r of D_k
//! a·x ≥ r − M (1 − b_k)       for every row a·x ≥ r of D_k
//! ```
//!
//! with equality rows split into both inequalities. `M` is taken per row from
//! the variable bounds (the largest possible violation of the row) and falls
//! back to the configured default when a needed bound is missing.

use crate::problem::{Constraint, MilpModel, Sense, Transformation, VariableDef};
use ehub_core::{HubError, HubResult};
use tracing::debug;

/// Default big-M when a row's range cannot be derived from bounds.
pub const DEFAULT_BIG_M: f64 = 1e4;

/// Rewrite every disjunction of `model` and mark [`Transformation::BigM`]
/// applied. Returns the number of disjunctions rewritten.
pub fn apply_big_m(model: &mut MilpModel, default_m: f64) -> HubResult<usize> {
    if !(default_m.is_finite() && default_m > 0.0) {
        return Err(HubError::Config(format!(
            "big-M must be positive and finite, got {default_m}"
        )));
    }

    let disjunctions = model.take_disjunctions();
    let count = disjunctions.len();

    for disjunction in disjunctions {
        let mut selectors = Vec::with_capacity(disjunction.disjuncts.len());
        for (k, rows) in disjunction.disjuncts.into_iter().enumerate() {
            let b = model.add_variable(VariableDef::binary(format!(
                "{}/select[{}]",
                disjunction.name, k
            )));
            selectors.push(b);

            for row in rows {
                for (sense, suffix) in split_equality(row.sense) {
                    let m = row_big_m(model, &row, sense, default_m);
                    let name = format!("{}{}", row.name, suffix);
                    let relaxed = match sense {
                        // a·x + M b ≤ r + M
                        Sense::Le => Constraint::le(name, row.lhs.clone() + m * b, row.rhs + m),
                        // a·x − M b ≥ r − M
                        _ => Constraint::ge(name, row.lhs.clone() - m * b, row.rhs - m),
                    };
                    model.add_constraint(relaxed);
                }
            }
        }
        model.add_eq(
            format!("{}/select", disjunction.name),
            crate::problem::LinearExpr::sum_of(&selectors),
            1.0,
        );
        debug!(
            disjunction = %disjunction.name,
            disjuncts = selectors.len(),
            "applied big-M reformulation"
        );
    }

    model.mark_applied(Transformation::BigM);
    Ok(count)
}

fn split_equality(sense: Sense) -> Vec<(Sense, &'static str)> {
    match sense {
        Sense::Eq => vec![(Sense::Le, "/ub"), (Sense::Ge, "/lb")],
        other => vec![(other, "")],
    }
}

fn row_big_m(model: &MilpModel, row: &Constraint, sense: Sense, default_m: f64) -> f64 {
    let (low, high) = model.expr_range(&row.lhs);
    let derived = match sense {
        Sense::Le => high.map(|h| h - row.rhs),
        _ => low.map(|l| row.rhs - l),
    };
    match derived {
        Some(m) if m.is_finite() => m.max(0.0),
        _ => default_m,
    }
}
