use super::ArchetypeConstraints;
use crate::problem::{LinearExpr, MilpModel, VariableDef};
use crate::technology::TechnologyModel;
use ehub_core::{HubError, HubResult, StorageCycle, StoragePerformance};

/// Storage balance and the power/energy size constraints.
///
/// ```text
/// level[t] = (1 − λ) level[t−1] + η_c input[t] − output[t] / η_d
/// level[t] ≤ size,  input[t] ≤ r_c size,  output[t] ≤ r_d size
/// ```
///
/// `level[0]` is `level[T]` for a cyclic horizon and
/// `initial_fraction · size` for an anchored one.
impl ArchetypeConstraints for StoragePerformance {
    fn add_constraints(
        &self,
        model: &mut MilpModel,
        tec: &mut TechnologyModel,
        time_steps: usize,
    ) -> HubResult<()> {
        let (input, output) = match (tec.inputs.values().next(), tec.outputs.values().next()) {
            (Some(i), Some(o)) => (i.clone(), o.clone()),
            _ => {
                return Err(HubError::Config(format!(
                    "storage '{}' at node '{}' needs one input and one output carrier",
                    tec.name, tec.node
                )))
            }
        };
        let prefix = tec.prefix();
        let retention = 1.0 - self.self_discharge;

        let level: Vec<_> = (1..=time_steps)
            .map(|t| {
                model.add_variable(
                    VariableDef::non_negative(format!("{prefix}/level[{t}]"))
                        .max(tec.params.size_max),
                )
            })
            .collect();

        for t in 0..time_steps {
            let step = t + 1;
            let previous: LinearExpr = if t > 0 {
                retention * level[t - 1]
            } else {
                match self.cycle {
                    StorageCycle::Cyclic => retention * level[time_steps - 1],
                    StorageCycle::Anchored { initial_fraction } => {
                        (retention * initial_fraction) * tec.size
                    }
                }
            };
            model.add_eq(
                format!("{prefix}/level_balance[{step}]"),
                level[t],
                previous + self.charge_efficiency * input[t]
                    - (1.0 / self.discharge_efficiency) * output[t],
            );
            model.add_le(format!("{prefix}/level_limit[{step}]"), level[t], tec.size);
            model.add_le(
                format!("{prefix}/charge_limit[{step}]"),
                input[t],
                self.charge_rate * tec.size,
            );
            model.add_le(
                format!("{prefix}/discharge_limit[{step}]"),
                output[t],
                self.discharge_rate * tec.size,
            );
        }

        tec.storage_level = level;
        Ok(())
    }
}
