pub mod build;
pub mod solve;
pub mod topology;
pub mod validate;

use anyhow::{Context, Result};
use ehub_core::HubData;
use std::path::Path;

/// Read a JSON case file.
pub fn load_case(path: &Path) -> Result<HubData> {
    HubData::load(path).with_context(|| format!("loading case {}", path.display()))
}
