use std::path::Path;

use anyhow::{bail, Result};
use tracing::info;

use super::load_case;

pub fn handle(case: &Path) -> Result<()> {
    let data = load_case(case)?;
    let diag = data.validate();
    print!("{diag}");
    if diag.has_errors() {
        bail!("{} is invalid: {}", case.display(), diag.summary());
    }
    info!(case = %case.display(), warnings = diag.warning_count(), "case is valid");
    println!("{} is valid", case.display());
    Ok(())
}
