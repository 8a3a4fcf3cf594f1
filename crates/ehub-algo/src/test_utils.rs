//! Small cases and technologies shared by unit and integration tests.

use ehub_core::{
    Breakpoint, ConnectionMatrix, ConversionPerformance, Economics, HubData, NetworkData,
    NodeData, Performance, RenewablePerformance, SizeBound, StorageCycle, StoragePerformance,
    TechnologyData, Topology,
};
use std::collections::BTreeMap;

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn efficiency(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(c, e)| (c.to_string(), *e)).collect()
}

/// Photovoltaics: RES, 100 EUR/MW, 0.5 EUR/MWh, 10 % fixed OPEX.
pub fn pv(capacity_factor: Vec<f64>, size_max: f64) -> TechnologyData {
    TechnologyData {
        performance: Performance::Res(RenewablePerformance { capacity_factor }),
        economics: Economics::linear(100.0, 0.5, 0.1),
        size_min: SizeBound::Scalar(0.0),
        size_max: SizeBound::Scalar(size_max),
        size_is_integer: false,
        input_carriers: Vec::new(),
        output_carriers: names(&["electricity"]),
    }
}

/// Gas boiler: CONV3 gas -> heat at 90 %.
pub fn boiler() -> TechnologyData {
    TechnologyData {
        performance: Performance::Conv3(ConversionPerformance {
            efficiency: efficiency(&[("heat", 0.9)]),
        }),
        economics: Economics::linear(50.0, 1.0, 0.02),
        size_min: SizeBound::Scalar(0.0),
        size_max: SizeBound::Scalar(20.0),
        size_is_integer: false,
        input_carriers: names(&["gas"]),
        output_carriers: names(&["heat"]),
    }
}

/// Heat pump: CONV2 electricity -> heat with COP 3.
pub fn heat_pump() -> TechnologyData {
    TechnologyData {
        performance: Performance::Conv2(ConversionPerformance {
            efficiency: efficiency(&[("heat", 3.0)]),
        }),
        economics: Economics::linear(80.0, 0.5, 0.02),
        size_min: SizeBound::Scalar(0.0),
        size_max: SizeBound::Scalar(10.0),
        size_is_integer: false,
        input_carriers: names(&["electricity"]),
        output_carriers: names(&["heat"]),
    }
}

/// Combined heat and power: CONV2 gas -> 35 % electricity and 50 % heat.
pub fn chp() -> TechnologyData {
    TechnologyData {
        performance: Performance::Conv2(ConversionPerformance {
            efficiency: efficiency(&[("electricity", 0.35), ("heat", 0.5)]),
        }),
        economics: Economics::linear(40.0, 2.0, 0.03),
        size_min: SizeBound::Scalar(0.0),
        size_max: SizeBound::Scalar(20.0),
        size_is_integer: false,
        input_carriers: names(&["gas"]),
        output_carriers: names(&["electricity", "heat"]),
    }
}

/// Boiler burning gas or hydrogen: CONV1.
pub fn gas_boiler_dual_fuel() -> TechnologyData {
    TechnologyData {
        performance: Performance::Conv1(ConversionPerformance {
            efficiency: efficiency(&[("gas", 0.9), ("hydrogen", 0.8)]),
        }),
        economics: Economics::linear(45.0, 1.0, 0.02),
        size_min: SizeBound::Scalar(0.0),
        size_max: SizeBound::Scalar(15.0),
        size_is_integer: false,
        input_carriers: names(&["gas", "hydrogen"]),
        output_carriers: names(&["heat"]),
    }
}

/// Battery: STOR electricity, 90 % each way.
pub fn battery(cycle: StorageCycle) -> TechnologyData {
    let mut performance = StoragePerformance::new(0.9, 0.9);
    performance.cycle = cycle;
    TechnologyData {
        performance: Performance::Stor(performance),
        economics: Economics::linear(30.0, 0.1, 0.01),
        size_min: SizeBound::Scalar(0.0),
        size_max: SizeBound::Scalar(10.0),
        size_is_integer: false,
        input_carriers: names(&["electricity"]),
        output_carriers: names(&["electricity"]),
    }
}

/// Breakpoints with falling marginal cost over [0, 10].
pub fn economies_of_scale() -> Vec<Breakpoint> {
    vec![
        Breakpoint::new(0.0, 0.0),
        Breakpoint::new(5.0, 600.0),
        Breakpoint::new(10.0, 1000.0),
    ]
}

/// One node `city`, carrier `electricity`, two time steps, a PV plant with
/// capacity factors [0.5, 0.8] and up to 10 MW, demand [3, 4].
pub fn single_node_case() -> HubData {
    HubData {
        topology: Topology {
            nodes: names(&["city"]),
            carriers: names(&["electricity"]),
            timesteps: names(&["2030-01-01 00:00", "2030-01-01 01:00"]),
            technologies: BTreeMap::from([("city".to_string(), names(&["PV"]))]),
            networks: BTreeMap::new(),
        },
        node_data: BTreeMap::from([(
            "city".to_string(),
            NodeData {
                demand: BTreeMap::from([("electricity".to_string(), vec![3.0, 4.0])]),
                climate_data: BTreeMap::from([("ghi".to_string(), vec![450.0, 720.0])]),
            },
        )]),
        technology_data: BTreeMap::from([(
            "city".to_string(),
            BTreeMap::from([("PV".to_string(), pv(vec![0.5, 0.8], 10.0))]),
        )]),
    }
}

/// `rural` hosts the PV plant, `city` has the demand; an electricity grid
/// carries power from `rural` to `city`. The `heat` carrier is unused.
pub fn two_node_case() -> HubData {
    let nodes = names(&["city", "rural"]);
    HubData {
        topology: Topology {
            nodes: nodes.clone(),
            carriers: names(&["electricity", "heat"]),
            timesteps: names(&["t1", "t2"]),
            technologies: BTreeMap::from([
                ("city".to_string(), Vec::new()),
                ("rural".to_string(), names(&["PV"])),
            ]),
            networks: BTreeMap::from([(
                "electricity".to_string(),
                BTreeMap::from([(
                    "grid".to_string(),
                    NetworkData::new(ConnectionMatrix::from_arcs(nodes, &[("rural", "city")]), 20.0),
                )]),
            )]),
        },
        node_data: BTreeMap::from([(
            "city".to_string(),
            NodeData {
                demand: BTreeMap::from([("electricity".to_string(), vec![3.0, 4.0])]),
                climate_data: BTreeMap::new(),
            },
        )]),
        technology_data: BTreeMap::from([(
            "rural".to_string(),
            BTreeMap::from([("PV".to_string(), pv(vec![0.5, 0.8], 10.0))]),
        )]),
    }
}
