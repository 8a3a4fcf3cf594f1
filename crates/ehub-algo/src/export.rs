//! Per-node CSV export of a solved hub.
//!
//! ```text
//! <dir>/<node>/size.csv               technology, size, capex, opex_fixed, opex_variable_total
//! <dir>/<node>/<carrier>_in.csv       timestep, <technology>...
//! <dir>/<node>/<carrier>_out.csv      timestep, <technology>...
//! ```

use crate::hub::EnergyHub;
use crate::results::TechnologyResult;
use csv::Writer;
use ehub_core::{HubError, HubResult, Megawatts};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

fn csv_error(path: &Path, err: csv::Error) -> HubError {
    HubError::Other(format!("writing {}: {}", path.display(), err))
}

type Flows = fn(&TechnologyResult) -> &BTreeMap<String, Vec<Megawatts>>;

fn inputs_of(r: &TechnologyResult) -> &BTreeMap<String, Vec<Megawatts>> {
    &r.inputs
}

fn outputs_of(r: &TechnologyResult) -> &BTreeMap<String, Vec<Megawatts>> {
    &r.outputs
}

fn fmt(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

/// Write the result tables of every node below `dir`; returns the files written.
pub fn export_results(hub: &EnergyHub, dir: impl AsRef<Path>, decimals: usize) -> HubResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let labels = &hub.sets().timestep_labels;
    let mut written = Vec::new();

    for node in &hub.sets().nodes {
        let results = hub.node_results(node)?;
        let node_dir = dir.join(node);
        std::fs::create_dir_all(&node_dir)?;

        let size_path = node_dir.join("size.csv");
        write_sizes(&size_path, &results, decimals)?;
        written.push(size_path);

        for carrier in &hub.sets().carriers {
            for (suffix, pick) in [("in", inputs_of as Flows), ("out", outputs_of as Flows)] {
                let columns: Vec<(&str, &Vec<Megawatts>)> = results
                    .iter()
                    .filter_map(|(name, r)| pick(r).get(carrier).map(|s| (name.as_str(), s)))
                    .collect();
                if columns.is_empty() {
                    continue;
                }
                let path = node_dir.join(format!("{carrier}_{suffix}.csv"));
                write_series(&path, labels, &columns, decimals)?;
                written.push(path);
            }
        }
    }

    info!(dir = %dir.display(), files = written.len(), "results exported");
    Ok(written)
}

fn write_sizes(path: &Path, results: &BTreeMap<String, TechnologyResult>, decimals: usize) -> HubResult<()> {
    let mut writer = Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    writer
        .write_record(["technology", "size", "capex", "opex_fixed", "opex_variable_total"])
        .map_err(|e| csv_error(path, e))?;
    for (name, r) in results {
        writer
            .write_record([
                name.clone(),
                fmt(r.size, decimals),
                fmt(r.capex.value(), decimals),
                fmt(r.opex_fixed.value(), decimals),
                fmt(r.opex_variable_total().value(), decimals),
            ])
            .map_err(|e| csv_error(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_series(
    path: &Path,
    labels: &[String],
    columns: &[(&str, &Vec<Megawatts>)],
    decimals: usize,
) -> HubResult<()> {
    let mut writer = Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    let header = std::iter::once("timestep").chain(columns.iter().map(|(name, _)| *name));
    writer.write_record(header).map_err(|e| csv_error(path, e))?;
    for (t, label) in labels.iter().enumerate() {
        let row = std::iter::once(label.clone()).chain(
            columns
                .iter()
                .map(|(_, series)| fmt(series.get(t).map_or(0.0, |v| v.value()), decimals)),
        );
        writer.write_record(row).map_err(|e| csv_error(path, e))?;
    }
    writer.flush()?;
    Ok(())
}
