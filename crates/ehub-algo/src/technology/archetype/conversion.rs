use super::ArchetypeConstraints;
use crate::problem::{LinearExpr, MilpModel};
use crate::technology::TechnologyModel;
use ehub_core::{ConversionPerformance, HubError, HubResult};

/// How a conversion technology ties inputs to outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionRule {
    /// CONV1: inputs pool into one energy stream that the outputs share,
    /// `Σ_o output_o = Σ_i η_i · input_i`
    Pooled,
    /// CONV2: every output follows total input with its own efficiency,
    /// `output_o = η_o · Σ_i input_i`
    Independent,
    /// CONV3: one input split across flexible outputs,
    /// `Σ_o output_o / η_o = input`
    FlexibleOutput,
}

/// Conversion constraints for one of the three conversion archetypes.
pub struct Conversion<'a> {
    rule: ConversionRule,
    performance: &'a ConversionPerformance,
}

impl<'a> Conversion<'a> {
    pub fn new(rule: ConversionRule, performance: &'a ConversionPerformance) -> Self {
        Self { rule, performance }
    }

    fn efficiency(&self, tec: &TechnologyModel, carrier: &str) -> HubResult<f64> {
        self.performance
            .efficiency
            .get(carrier)
            .copied()
            .ok_or_else(|| {
                HubError::Config(format!(
                    "technology '{}' at node '{}' has no efficiency for carrier '{}'",
                    tec.name, tec.node, carrier
                ))
            })
    }
}

impl ArchetypeConstraints for Conversion<'_> {
    fn add_constraints(
        &self,
        model: &mut MilpModel,
        tec: &mut TechnologyModel,
        time_steps: usize,
    ) -> HubResult<()> {
        let prefix = tec.prefix();

        for t in 0..time_steps {
            let step = t + 1;
            match self.rule {
                ConversionRule::Pooled => {
                    let mut pooled = LinearExpr::new();
                    for (carrier, inputs) in &tec.inputs {
                        pooled.add_term(inputs[t], self.efficiency(tec, carrier)?);
                    }
                    model.add_eq(
                        format!("{prefix}/conversion[{step}]"),
                        tec.total_output(t),
                        pooled,
                    );
                }
                ConversionRule::Independent => {
                    for (carrier, outputs) in &tec.outputs {
                        let eta = self.efficiency(tec, carrier)?;
                        model.add_eq(
                            format!("{prefix}/conversion[{carrier},{step}]"),
                            outputs[t],
                            tec.total_input(t) * eta,
                        );
                    }
                }
                ConversionRule::FlexibleOutput => {
                    let mut required = LinearExpr::new();
                    for (carrier, outputs) in &tec.outputs {
                        required.add_term(outputs[t], 1.0 / self.efficiency(tec, carrier)?);
                    }
                    model.add_eq(
                        format!("{prefix}/conversion[{step}]"),
                        required,
                        tec.total_input(t),
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::problem::MilpModel;
    use crate::technology::TechnologyBuilder;
    use crate::test_utils::{boiler, chp, gas_boiler_dual_fuel};

    fn carriers() -> Vec<String> {
        ["electricity", "heat", "gas", "hydrogen"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_pooled_conversion_weights_inputs() {
        let mut model = MilpModel::new();
        let carriers = carriers();
        let tec = TechnologyBuilder::new(&mut model, &carriers, 1)
            .build("city", "boiler", &gas_boiler_dual_fuel())
            .unwrap();

        let row = model.find_constraint("city/boiler/conversion[1]").unwrap();
        assert_eq!(row.lhs.coefficient(tec.output("heat", 0).unwrap()), 1.0);
        assert_eq!(row.lhs.coefficient(tec.input("gas", 0).unwrap()), -0.9);
        assert_eq!(row.lhs.coefficient(tec.input("hydrogen", 0).unwrap()), -0.8);
    }

    #[test]
    fn test_independent_outputs_follow_total_input() {
        let mut model = MilpModel::new();
        let carriers = carriers();
        let tec = TechnologyBuilder::new(&mut model, &carriers, 2)
            .build("city", "CHP", &chp())
            .unwrap();

        let gas = tec.input("gas", 1).unwrap();
        let el = model
            .find_constraint("city/CHP/conversion[electricity,2]")
            .unwrap();
        assert_eq!(el.lhs.coefficient(gas), -0.35);
        let heat = model.find_constraint("city/CHP/conversion[heat,2]").unwrap();
        assert_eq!(heat.lhs.coefficient(gas), -0.5);

        // 10 MW gas -> 3.5 MW electricity and 5 MW heat
        let mut values = vec![0.0; model.num_variables()];
        values[tec.size.index()] = 10.0;
        values[gas.index()] = 10.0;
        values[tec.output("electricity", 1).unwrap().index()] = 3.5;
        values[tec.output("heat", 1).unwrap().index()] = 5.0;
        values[tec.capex.index()] = 10.0 * 40.0;
        values[tec.opex_fixed.index()] = 10.0 * 40.0 * 0.03;
        values[tec.opex_variable[1].index()] = 8.5 * 2.0;
        assert!(model.check(&values, 1e-9).is_empty());
    }

    #[test]
    fn test_flexible_output_divides_by_efficiency() {
        let mut model = MilpModel::new();
        let carriers = carriers();
        let tec = TechnologyBuilder::new(&mut model, &carriers, 1)
            .build("city", "boiler", &boiler())
            .unwrap();

        let row = model.find_constraint("city/boiler/conversion[1]").unwrap();
        let heat = tec.output("heat", 0).unwrap();
        assert!((row.lhs.coefficient(heat) - 1.0 / 0.9).abs() < 1e-12);
        assert_eq!(row.lhs.coefficient(tec.input("gas", 0).unwrap()), -1.0);
    }
}
