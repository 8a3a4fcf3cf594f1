use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ehub_algo::{EnergyHub, ModelConfig, SolveStatus, SolverKind, TechnologyResult};
use serde::Serialize;
use tabwriter::TabWriter;
use tracing::{info, warn};

use super::load_case;

/// Where the hub comes from.
pub enum Source<'a> {
    Case(&'a Path),
    Snapshot(&'a Path),
}

pub struct SolveOptions {
    pub model: ModelConfig,
    pub solver: SolverKind,
    pub out: Option<PathBuf>,
    pub decimals: usize,
    pub json: bool,
}

#[derive(Serialize)]
struct Summary {
    status: SolveStatus,
    solver: SolverKind,
    total_cost: Option<f64>,
    technologies: Vec<TechnologyResult>,
    exported: Vec<PathBuf>,
}

pub fn handle(source: Source<'_>, options: SolveOptions) -> Result<()> {
    let mut hub = match source {
        Source::Case(path) => EnergyHub::with_config(load_case(path)?, options.model)?,
        Source::Snapshot(path) => EnergyHub::load_snapshot(path)
            .with_context(|| format!("loading snapshot {}", path.display()))?,
    };
    if !hub.is_constructed() {
        hub.construct_model().context("constructing model")?;
    }

    let status = hub.solve(options.solver)?;
    info!(status = %status, solver = %options.solver, "solve returned");

    let mut summary = Summary {
        status,
        solver: options.solver,
        total_cost: None,
        technologies: Vec::new(),
        exported: Vec::new(),
    };
    if status == SolveStatus::Optimal {
        summary.total_cost = Some(hub.total_cost()?.value());
        for node in &hub.sets().nodes {
            summary.technologies.extend(hub.node_results(node)?.into_values());
        }
        if let Some(dir) = &options.out {
            summary.exported = export(&hub, dir, options.decimals)?;
        }
    }

    if options.json {
        serde_json::to_writer_pretty(io::stdout(), &summary)
            .map_err(|err| anyhow::anyhow!("serializing solve summary to JSON: {err}"))?;
        println!();
    } else {
        print_summary(&summary)?;
    }

    if status != SolveStatus::Optimal {
        bail!("no optimal solution: solver reported {status}");
    }
    Ok(())
}

#[cfg(feature = "desktop")]
fn export(hub: &EnergyHub, dir: &Path, decimals: usize) -> Result<Vec<PathBuf>> {
    ehub_algo::export_results(hub, dir, decimals)
        .with_context(|| format!("exporting results to {}", dir.display()))
}

#[cfg(not(feature = "desktop"))]
fn export(_hub: &EnergyHub, dir: &Path, _decimals: usize) -> Result<Vec<PathBuf>> {
    warn!(dir = %dir.display(), "CSV export needs the `desktop` feature; skipping");
    Ok(Vec::new())
}

fn print_summary(summary: &Summary) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "Status\t{}", summary.status)?;
    writeln!(writer, "Solver\t{}", summary.solver)?;
    if let Some(cost) = summary.total_cost {
        writeln!(writer, "Total cost\t{cost:.2}")?;
    }
    if !summary.technologies.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "NODE\tTECHNOLOGY\tSIZE\tCAPEX\tOPEX FIXED\tOPEX VARIABLE")?;
        for r in &summary.technologies {
            writeln!(
                writer,
                "{}\t{}\t{:.3}\t{:.2}\t{:.2}\t{:.2}",
                r.node,
                r.technology,
                r.size,
                r.capex.value(),
                r.opex_fixed.value(),
                r.opex_variable_total().value()
            )?;
        }
    }
    for path in &summary.exported {
        writeln!(writer, "Wrote\t{}", path.display())?;
    }
    writer.flush()?;
    if summary.status != SolveStatus::Optimal {
        warn!("no results to report");
    }
    Ok(())
}
