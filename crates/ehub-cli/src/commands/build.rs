use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use ehub_algo::{EnergyHub, HubStats, ModelConfig};
use tabwriter::TabWriter;
use tracing::info;

use super::load_case;

pub fn handle(case: &Path, config: ModelConfig, snapshot: Option<&Path>, json: bool) -> Result<()> {
    let data = load_case(case)?;
    let mut hub = EnergyHub::with_config(data, config)?;
    hub.construct_model()
        .with_context(|| format!("constructing model for {}", case.display()))?;

    let stats = hub.stats()?;
    if json {
        serde_json::to_writer_pretty(io::stdout(), &stats)
            .map_err(|err| anyhow::anyhow!("serializing model statistics to JSON: {err}"))?;
        println!();
    } else {
        print_stats(&stats)?;
    }

    if let Some(path) = snapshot {
        hub.save_snapshot(path)
            .with_context(|| format!("saving snapshot {}", path.display()))?;
        info!(path = %path.display(), "snapshot written");
    }
    Ok(())
}

pub fn print_stats(stats: &HubStats) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "Nodes\t{}", stats.nodes)?;
    writeln!(writer, "Carriers\t{}", stats.carriers)?;
    writeln!(writer, "Time steps\t{}", stats.time_steps)?;
    writeln!(writer, "Technologies\t{}", stats.technologies)?;
    writeln!(writer, "Networks\t{} ({} arcs)", stats.networks, stats.arcs)?;
    writeln!(writer, "Balance rows\t{}", stats.balance_rows)?;
    writeln!(
        writer,
        "Variables\t{} ({} continuous, {} integer, {} binary)",
        stats.model.variables, stats.model.continuous, stats.model.integer, stats.model.binary
    )?;
    writeln!(writer, "Constraints\t{}", stats.model.constraints)?;
    writeln!(writer, "Disjunctions\t{}", stats.model.disjunctions)?;
    writeln!(writer, "Big-M required\t{}", stats.big_m_required)?;
    writer.flush()?;
    Ok(())
}
