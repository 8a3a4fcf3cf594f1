use super::ArchetypeConstraints;
use crate::problem::MilpModel;
use crate::technology::TechnologyModel;
use ehub_core::{HubError, HubResult, RenewablePerformance};

/// `output[t,c] ≤ cf[t] · size`; curtailment is free.
impl ArchetypeConstraints for RenewablePerformance {
    fn add_constraints(
        &self,
        model: &mut MilpModel,
        tec: &mut TechnologyModel,
        time_steps: usize,
    ) -> HubResult<()> {
        if self.capacity_factor.len() < time_steps {
            return Err(HubError::Config(format!(
                "technology '{}' at node '{}': capacity_factor covers {} of {} time steps",
                tec.name,
                tec.node,
                self.capacity_factor.len(),
                time_steps
            )));
        }
        let prefix = tec.prefix();
        for (carrier, outputs) in &tec.outputs {
            for (t, output) in outputs.iter().enumerate().take(time_steps) {
                model.add_le(
                    format!("{prefix}/capacity_factor[{carrier},{}]", t + 1),
                    *output,
                    self.capacity_factor[t] * tec.size,
                );
            }
        }
        Ok(())
    }
}
