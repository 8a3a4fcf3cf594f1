//! Build, solve and read back small hubs.

use ehub_algo::test_utils::{single_node_case, two_node_case};
use ehub_algo::{EnergyHub, SolveStatus, SolverKind};
use ehub_core::{HubError, SizeBound};

fn solved(data: ehub_core::HubData) -> EnergyHub {
    let mut hub = EnergyHub::new(data).unwrap();
    hub.construct_model().unwrap();
    let status = hub.solve(SolverKind::Clarabel).expect("solve should run");
    assert_eq!(status, SolveStatus::Optimal);
    hub
}

#[test]
fn test_single_node_renewable_case() {
    let hub = solved(single_node_case());
    let pv = hub.technology_result("city", "PV").unwrap();

    // capacity factors bound the outputs at the largest size
    let output = &pv.outputs["electricity"];
    assert!(output[0].value() <= 0.5 * 10.0 + 1e-6);
    assert!(output[1].value() <= 0.8 * 10.0 + 1e-6);
    assert!((output[0].value() - 3.0).abs() < 1e-5);
    assert!((output[1].value() - 4.0).abs() < 1e-5);

    // step 1 needs 0.5 · size ≥ 3
    assert!((pv.size - 6.0).abs() < 1e-4, "size {}", pv.size);

    // opex lower bound: served demand at the variable rate, fixed share of
    // the smallest feasible plant
    let variable = 0.5 * (3.0 + 4.0);
    let fixed = 0.1 * 100.0 * 6.0;
    let total = hub.total_cost().unwrap().value();
    assert!(total >= variable + fixed - 1e-4);
    assert!((total - (600.0 + fixed + variable)).abs() < 1e-3, "total {total}");

    assert!((pv.opex_variable_total().value() - variable).abs() < 1e-5);
    assert!((hub.node_cost("city").unwrap().value() - total).abs() < 1e-4);
}

#[test]
fn test_network_carries_remote_generation() {
    let hub = solved(two_node_case());
    assert!(hub.node_results("city").unwrap().is_empty());

    let pv = hub.technology_result("rural", "PV").unwrap();
    assert!((pv.size - 6.0).abs() < 1e-4);

    let flows = hub.network_flows().unwrap();
    assert_eq!(flows[0].network, "electricity/grid");
    assert_eq!((flows[0].from.as_str(), flows[0].to.as_str()), ("rural", "city"));
    assert!((flows[0].flows[0].value() - 3.0).abs() < 1e-5);
}

#[test]
fn test_infeasible_demand_is_a_status() {
    let mut data = single_node_case();
    if let Some(tec) = data.technology_data.get_mut("city").and_then(|m| m.get_mut("PV")) {
        tec.size_max = SizeBound::Scalar(2.0);
    }
    let mut hub = EnergyHub::new(data).unwrap();
    hub.construct_model().unwrap();
    let status = hub.solve(SolverKind::Clarabel).unwrap();
    assert_eq!(status, SolveStatus::Infeasible);
    assert!(matches!(hub.total_cost(), Err(HubError::Solver(_))));
}

#[test]
fn test_results_before_solve() {
    let mut hub = EnergyHub::new(single_node_case()).unwrap();
    assert!(matches!(hub.total_cost(), Err(HubError::NotBuilt)));
    hub.construct_model().unwrap();
    assert!(matches!(hub.total_cost(), Err(HubError::NotSolved)));
    assert!(matches!(
        hub.technology_result("city", "Wind"),
        Err(HubError::NotSolved)
    ));
}

#[test]
fn test_unknown_technology_result() {
    let hub = solved(single_node_case());
    assert!(matches!(
        hub.technology_result("city", "Wind"),
        Err(HubError::UnknownTechnology { .. })
    ));
    assert!(matches!(hub.node_results("harbour"), Err(HubError::UnknownNode(_))));
}

#[test]
fn test_snapshot_round_trip() {
    let mut hub = EnergyHub::new(two_node_case()).unwrap();
    hub.construct_model().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hub.json");
    hub.save_snapshot(&path).unwrap();
    let restored = EnergyHub::load_snapshot(&path).unwrap();

    assert_eq!(restored.sets(), hub.sets());
    for (name, node) in hub.nodes() {
        let other = restored.node(name).unwrap();
        for (tec, model) in &node.technologies {
            assert_eq!(other.technology(tec).unwrap().params, model.params);
        }
    }
    assert_eq!(restored.model(), hub.model());
    assert!(restored.is_constructed());
    assert!(restored.solution().is_none());
    assert_eq!(restored, hub);
}

#[test]
fn test_snapshot_keeps_solution() {
    let hub = solved(single_node_case());
    let bytes = hub.to_snapshot_bytes().unwrap();
    let restored = EnergyHub::from_snapshot_bytes(&bytes).unwrap();
    assert_eq!(
        restored.total_cost().unwrap().value(),
        hub.total_cost().unwrap().value()
    );
}

#[cfg(feature = "desktop")]
#[test]
fn test_export_writes_per_node_tables() {
    let hub = solved(two_node_case());
    let dir = tempfile::tempdir().unwrap();
    let files = ehub_algo::export_results(&hub, dir.path(), 3).unwrap();

    let rural_size = dir.path().join("rural").join("size.csv");
    assert!(files.contains(&rural_size));
    let sizes = std::fs::read_to_string(&rural_size).unwrap();
    let mut lines = sizes.lines();
    assert_eq!(
        lines.next(),
        Some("technology,size,capex,opex_fixed,opex_variable_total")
    );
    assert!(lines.next().unwrap().starts_with("PV,6.000,600.000,60.000,"));

    let output = std::fs::read_to_string(dir.path().join("rural").join("electricity_out.csv")).unwrap();
    assert_eq!(output.lines().next(), Some("timestep,PV"));
    assert_eq!(output.lines().nth(1), Some("t1,3.000"));

    // city has no technologies: only its (empty) size table
    assert!(!dir.path().join("city").join("electricity_out.csv").exists());
}
