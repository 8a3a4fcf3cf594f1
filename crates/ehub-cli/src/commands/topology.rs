use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use ehub_core::HubData;
use tabwriter::TabWriter;

use super::load_case;

fn mean(series: &[f64]) -> f64 {
    if series.is_empty() {
        0.0
    } else {
        series.iter().sum::<f64>() / series.len() as f64
    }
}

pub fn handle(case: &Path) -> Result<()> {
    let data = load_case(case)?;
    print_topology(&data, io::stdout())
}

pub fn print_topology(data: &HubData, out: impl Write) -> Result<()> {
    let topology = &data.topology;
    let mut writer = TabWriter::new(out);

    writeln!(writer, "Carriers:\t{}", topology.carriers.join(", "))?;
    match (topology.timesteps.first(), topology.timesteps.last()) {
        (Some(first), Some(last)) => writeln!(
            writer,
            "Time steps:\t{} ({} .. {})",
            topology.time_steps(),
            first,
            last
        )?,
        _ => writeln!(writer, "Time steps:\t0")?,
    }

    writeln!(writer)?;
    writeln!(writer, "NODE\tTECHNOLOGY\tARCHETYPE\tSIZE")?;
    for node in &topology.nodes {
        let technologies = topology.technologies.get(node).map(Vec::as_slice).unwrap_or_default();
        if technologies.is_empty() {
            writeln!(writer, "{node}\t-\t-\t-")?;
        }
        for name in technologies {
            match data.technology(node, name) {
                Ok(tec) => {
                    let (lo, hi) = tec.size_range().unwrap_or((f64::NAN, f64::NAN));
                    writeln!(writer, "{node}\t{name}\t{}\t{lo} .. {hi}", tec.archetype())?;
                }
                Err(_) => writeln!(writer, "{node}\t{name}\t(no data)\t-")?,
            }
        }
    }

    writeln!(writer)?;
    writeln!(writer, "NODE\tSERIES\tMEAN")?;
    for node in &topology.nodes {
        let Some(node_data) = data.node(node) else {
            continue;
        };
        for (carrier, series) in &node_data.demand {
            writeln!(writer, "{node}\tdemand {carrier}\t{:.3}", mean(series))?;
        }
        for (variable, series) in &node_data.climate_data {
            writeln!(writer, "{node}\tclimate {variable}\t{:.3}", mean(series))?;
        }
    }

    if !topology.networks.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "NETWORK\tFROM\tTO\tCAPACITY\tLOSS")?;
        for (carrier, name, network) in topology.networks_iter() {
            for (from, to) in network.connection.connected_pairs() {
                writeln!(
                    writer,
                    "{carrier}/{name}\t{from}\t{to}\t{}\t{}",
                    network.capacity, network.loss
                )?;
            }
        }
        for (carrier, name, network) in topology.networks_iter() {
            let stats = network.stats();
            writeln!(
                writer,
                "{carrier}/{name}:\t{} arcs, {} component(s), density {:.2}",
                stats.arc_count, stats.components, stats.density
            )?;
        }
    }

    writer.flush()?;
    Ok(())
}
