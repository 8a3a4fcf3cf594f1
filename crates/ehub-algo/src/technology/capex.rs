//! Cost constraints shared by every archetype.

use super::TechnologyModel;
use crate::problem::{Constraint, Disjunction, LinearExpr, MilpModel, Transformation};
use ehub_core::{Breakpoint, CapexModel, Economics, HubError, HubResult};

/// CAPEX, fixed OPEX and variable OPEX rows.
pub(super) fn add_cost_constraints(
    model: &mut MilpModel,
    tec: &mut TechnologyModel,
    economics: &Economics,
) -> HubResult<()> {
    let prefix = tec.prefix();

    match economics.capex_model {
        CapexModel::Linear => {
            model.add_eq(
                format!("{prefix}/capex"),
                tec.capex,
                economics.unit_capex * tec.size,
            );
        }
        CapexModel::PiecewiseLinear => {
            add_piecewise_capex(model, tec, &economics.capex_breakpoints)?;
            tec.pending.insert(Transformation::BigM);
        }
    }

    model.add_eq(
        format!("{prefix}/opex_fixed"),
        tec.opex_fixed,
        economics.opex_fixed * tec.capex,
    );

    for (t, opex) in tec.opex_variable.iter().enumerate() {
        model.add_eq(
            format!("{prefix}/opex_variable[{}]", t + 1),
            *opex,
            tec.total_output(t) * economics.opex_variable,
        );
    }

    Ok(())
}

/// One disjunct per segment `[x_k, x_{k+1}]`:
/// `x_k ≤ size ≤ x_{k+1}` and `CAPEX = y_k + s_k (size − x_k)`.
fn add_piecewise_capex(
    model: &mut MilpModel,
    tec: &TechnologyModel,
    points: &[Breakpoint],
) -> HubResult<()> {
    if points.len() < 2 {
        return Err(HubError::Config(format!(
            "technology '{}' at node '{}' uses piecewise CAPEX without breakpoints",
            tec.name, tec.node
        )));
    }
    let prefix = tec.prefix();

    let disjuncts = points
        .windows(2)
        .enumerate()
        .map(|(k, seg)| {
            let (lo, hi) = (seg[0], seg[1]);
            let slope = (hi.capex - lo.capex) / (hi.size - lo.size);
            let name = format!("{prefix}/capex_segment[{k}]");
            vec![
                Constraint::ge(format!("{name}/lower"), tec.size, lo.size),
                Constraint::le(format!("{name}/upper"), tec.size, hi.size),
                Constraint::eq(
                    format!("{name}/curve"),
                    tec.capex,
                    LinearExpr::constant(lo.capex - slope * lo.size) + slope * tec.size,
                ),
            ]
        })
        .collect();

    model.add_disjunction(Disjunction {
        name: format!("{prefix}/capex_curve"),
        disjuncts,
    });

    // tighten CAPEX so the big-M pass can derive finite constants
    let (min_capex, max_capex) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, p| {
        (acc.0.min(p.capex), acc.1.max(p.capex))
    });
    let capex = model.variable_mut(tec.capex);
    capex.lower = Some(min_capex.max(0.0));
    capex.upper = Some(max_capex);
    Ok(())
}
