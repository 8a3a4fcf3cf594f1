//! Technology-Archetype Constraint Library
//!
//! Each archetype contributes its physical constraints through
//! [`ArchetypeConstraints`]. The cost scaffolding and the size variable are
//! shared and already declared when an archetype is invoked; an archetype only
//! adds rows (and, for storage, the state-of-charge variables).
//!
//! | Archetype | Inputs | Outputs | Relationship per time step               |
//! |-----------|--------|---------|------------------------------------------|
//! | RES       | none   | 1       | `output ≤ cf[t] · size`                  |
//! | CONV1     | n      | n       | `Σ_o output = Σ_i η_i · input_i`         |
//! | CONV2     | n      | n       | `output_o = η_o · Σ_i input_i`           |
//! | CONV3     | 1      | n       | `Σ_o output_o / η_o = input`             |
//! | STOR      | 1      | 1       | `level[t] = (1−λ) level[t−1] + …`        |
//!
//! Adding an archetype means adding a [`Performance`] variant and an
//! implementation here; [`constraints_for`] is the only dispatch point.

mod conversion;
mod renewable;
mod storage;

pub use conversion::{Conversion, ConversionRule};

use super::TechnologyModel;
use crate::problem::MilpModel;
use ehub_core::{HubResult, Performance};

/// Archetype-specific contribution to a technology submodel.
pub trait ArchetypeConstraints {
    /// Add the archetype's rows for every time step `0..time_steps`.
    fn add_constraints(
        &self,
        model: &mut MilpModel,
        tec: &mut TechnologyModel,
        time_steps: usize,
    ) -> HubResult<()>;
}

impl<T: ArchetypeConstraints + ?Sized> ArchetypeConstraints for &T {
    fn add_constraints(
        &self,
        model: &mut MilpModel,
        tec: &mut TechnologyModel,
        time_steps: usize,
    ) -> HubResult<()> {
        (**self).add_constraints(model, tec, time_steps)
    }
}

/// The constraint family for a technology's performance data.
pub fn constraints_for(performance: &Performance) -> Box<dyn ArchetypeConstraints + '_> {
    match performance {
        Performance::Res(perf) => Box::new(perf),
        Performance::Conv1(perf) => Box::new(Conversion::new(ConversionRule::Pooled, perf)),
        Performance::Conv2(perf) => Box::new(Conversion::new(ConversionRule::Independent, perf)),
        Performance::Conv3(perf) => Box::new(Conversion::new(ConversionRule::FlexibleOutput, perf)),
        Performance::Stor(perf) => Box::new(perf),
    }
}
