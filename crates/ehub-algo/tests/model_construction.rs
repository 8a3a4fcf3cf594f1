//! Hub construction tests: variable bounds, cost rows, energy balance and the
//! big-M flag.

use ehub_algo::test_utils::{battery, economies_of_scale, heat_pump, pv, single_node_case, two_node_case};
use ehub_algo::{EnergyHub, Sense, SolverKind, Transformation};
use ehub_core::{Economics, HubData, HubError, NodeData, SizeBound, StorageCycle, TechnologyData};
use std::collections::BTreeMap;

/// One node with PV, a heat pump and a battery; electricity and heat demand.
fn district_case() -> HubData {
    let mut data = single_node_case();
    data.topology.nodes = vec!["district".into()];
    data.topology.carriers = vec!["electricity".into(), "heat".into()];
    data.topology.technologies = BTreeMap::from([(
        "district".to_string(),
        vec!["PV".into(), "HeatPump".into(), "Battery".into()],
    )]);
    data.node_data = BTreeMap::from([(
        "district".to_string(),
        NodeData {
            demand: BTreeMap::from([
                ("electricity".to_string(), vec![3.0, 4.0]),
                ("heat".to_string(), vec![3.0, 3.0]),
            ]),
            climate_data: BTreeMap::new(),
        },
    )]);
    data.technology_data = BTreeMap::from([(
        "district".to_string(),
        BTreeMap::from([
            ("PV".to_string(), pv(vec![0.5, 0.8], 20.0)),
            ("HeatPump".to_string(), heat_pump()),
            ("Battery".to_string(), battery(StorageCycle::Cyclic)),
        ]),
    )]);
    data
}

fn constructed(data: HubData) -> EnergyHub {
    let mut hub = EnergyHub::new(data).expect("sets should build");
    hub.construct_model().expect("model should construct");
    hub
}

#[test]
fn test_series_size_bounds_resolve_to_extremes() {
    let mut data = single_node_case();
    let tec = data
        .technology_data
        .get_mut("city")
        .and_then(|m| m.get_mut("PV"))
        .unwrap();
    tec.size_min = SizeBound::Series(vec![2.0, 1.0, 3.0]);
    tec.size_max = SizeBound::Series(vec![7.0, 12.0, 9.0]);

    let hub = constructed(data);
    let params = &hub.node("city").unwrap().technology("PV").unwrap().params;
    assert_eq!(params.size_min, 1.0);
    assert_eq!(params.size_max, 12.0);
    assert!(params.size_min <= params.size_max);

    let size = hub.node("city").unwrap().technology("PV").unwrap().size;
    let def = hub.model().variable(size);
    assert_eq!(def.lower, Some(1.0));
    assert_eq!(def.upper, Some(12.0));
}

#[test]
fn test_flow_bounds_follow_size_max() {
    let hub = constructed(district_case());
    for tec in hub.node("district").unwrap().technologies.values() {
        for flows in tec.inputs.values().chain(tec.outputs.values()) {
            assert_eq!(flows.len(), 2);
            for var in flows {
                let def = hub.model().variable(*var);
                assert_eq!(def.lower, Some(0.0), "{}", def.name);
                assert_eq!(def.upper, Some(tec.params.size_max), "{}", def.name);
            }
        }
    }
}

#[test]
fn test_renewables_have_no_input_variables() {
    let hub = constructed(district_case());
    let node = hub.node("district").unwrap();
    let pv = node.technology("PV").unwrap();
    assert!(pv.inputs.is_empty());
    assert!(hub.model().find_variable("district/PV/input[electricity,1]").is_none());
    assert!(!node.technology("HeatPump").unwrap().inputs.is_empty());
}

#[test]
fn test_solved_flows_respect_bounds() {
    let mut hub = constructed(district_case());
    hub.solve(SolverKind::Clarabel).expect("solve should run");
    let values = &hub.solution().unwrap().values;

    let violations = hub.model().check(values, 1e-5);
    assert!(violations.is_empty(), "violations: {:?}", violations);

    for tec in hub.node("district").unwrap().technologies.values() {
        for flows in tec.inputs.values().chain(tec.outputs.values()) {
            for var in flows {
                let v = values[var.index()];
                assert!(v >= -1e-6 && v <= tec.params.size_max + 1e-6);
            }
        }
    }
}

#[test]
fn test_fixed_opex_is_fraction_of_capex() {
    let hub = constructed(district_case());
    for tec in hub.node("district").unwrap().technologies.values() {
        let row = hub
            .model()
            .find_constraint(&format!("{}/opex_fixed", tec.prefix()))
            .unwrap();
        assert_eq!(row.sense, Sense::Eq);
        assert_eq!(row.lhs.coefficient(tec.capex), -tec.params.opex_fixed);

        for size in [0.0, 1.5, 7.25, 10.0] {
            let mut values = vec![0.0; hub.model().num_variables()];
            let capex = tec.params.unit_capex * size;
            values[tec.size.index()] = size;
            values[tec.capex.index()] = capex;
            values[tec.opex_fixed.index()] = capex * tec.params.opex_fixed;
            assert!(row.residual(&values) <= 1e-9);
        }
    }
}

#[test]
fn test_variable_opex_tracks_output() {
    let mut hub = constructed(district_case());
    hub.solve(SolverKind::Clarabel).unwrap();
    let solution = hub.solution().unwrap();

    for tec in hub.node("district").unwrap().technologies.values() {
        for (t, opex) in tec.opex_variable.iter().enumerate() {
            let expected = solution.evaluate(&tec.total_output(t)).unwrap() * tec.params.opex_variable;
            let actual = solution.value(*opex).unwrap();
            assert!(
                (actual - expected).abs() < 1e-5,
                "{} step {}: {} vs {}",
                tec.name,
                t + 1,
                actual,
                expected
            );
        }
    }
}

#[test]
fn test_balance_rows_cover_production_network_and_demand() {
    let hub = constructed(two_node_case());
    let grid = &hub.networks()[0];
    let arc = grid.arc("rural", "city").unwrap();
    let pv = hub.node("rural").unwrap().technology("PV").unwrap();

    for t in 0..2 {
        let city = hub
            .model()
            .find_constraint(&format!("balance[electricity,city,{}]", t + 1))
            .unwrap();
        assert_eq!(city.lhs.coefficient(arc.flows[t]), 1.0);
        assert_eq!(city.rhs, [3.0, 4.0][t]);

        let rural = hub
            .model()
            .find_constraint(&format!("balance[electricity,rural,{}]", t + 1))
            .unwrap();
        assert_eq!(rural.lhs.coefficient(arc.flows[t]), -1.0);
        assert_eq!(rural.lhs.coefficient(pv.outputs["electricity"][t]), 1.0);
        assert_eq!(rural.rhs, 0.0);
    }
    // the heat carrier has neither supply nor demand
    assert!(hub.model().find_constraint("balance[heat,city,1]").is_none());
}

#[test]
fn test_balance_holds_at_solution() {
    let mut hub = constructed(two_node_case());
    hub.solve(SolverKind::Clarabel).unwrap();
    let solution = hub.solution().unwrap();

    let city = hub.node("city").unwrap();
    let rural = hub.node("rural").unwrap();
    let grid = &hub.networks()[0];
    for t in 0..2 {
        for (name, node) in [("city", city), ("rural", rural)] {
            let supply = solution.evaluate(&node.production("electricity", t)).unwrap()
                + solution.evaluate(&grid.net_inflow(name, t)).unwrap();
            let demand = hub.data().node(name).map_or(0.0, |d| d.demand_at("electricity", t))
                + solution.evaluate(&node.consumption("electricity", t)).unwrap();
            assert!((supply - demand).abs() < 1e-5, "{name} step {}", t + 1);
        }
    }
    let flows = hub.network_flows().unwrap();
    assert_eq!(flows.len(), 1);
    assert!((flows[0].flows[1].value() - 4.0).abs() < 1e-5);
}

#[test]
fn test_piecewise_capex_sets_big_m_flag() {
    let linear = constructed(single_node_case());
    assert!(!linear.big_m_required());
    assert!(linear.model().disjunctions().is_empty());

    let mut data = single_node_case();
    let tec: &mut TechnologyData = data
        .technology_data
        .get_mut("city")
        .and_then(|m| m.get_mut("PV"))
        .unwrap();
    tec.economics = Economics::piecewise(economies_of_scale(), 0.5, 0.1);
    let mut piecewise = constructed(data);

    assert!(piecewise.big_m_required());
    assert_eq!(piecewise.pending_transformations(), vec![Transformation::BigM]);
    assert!(piecewise.node("city").unwrap().pending().contains(&Transformation::BigM));
    assert_eq!(piecewise.model().disjunctions().len(), 1);
    assert_eq!(piecewise.model().disjunctions()[0].disjuncts.len(), 2);

    piecewise.apply_transformations().unwrap();
    assert!(!piecewise.big_m_required());
    assert!(piecewise.model().disjunctions().is_empty());
    assert!(piecewise.model().applied().contains(&Transformation::BigM));
    assert_eq!(piecewise.model().stats().binary, 2);
}

#[test]
fn test_clarabel_refuses_big_m_binaries() {
    let mut data = single_node_case();
    if let Some(tec) = data.technology_data.get_mut("city").and_then(|m| m.get_mut("PV")) {
        tec.economics = Economics::piecewise(economies_of_scale(), 0.5, 0.1);
    }
    let mut hub = constructed(data);
    let err = hub.solve(SolverKind::Clarabel).unwrap_err();
    assert!(matches!(err, HubError::Solver(_)));
}

#[cfg(feature = "solver-highs")]
#[test]
fn test_highs_solves_piecewise_capex() {
    let mut data = single_node_case();
    if let Some(tec) = data.technology_data.get_mut("city").and_then(|m| m.get_mut("PV")) {
        tec.economics = Economics::piecewise(economies_of_scale(), 0.5, 0.1);
    }
    let mut hub = constructed(data);
    let status = hub.solve(SolverKind::Highs).unwrap();
    assert!(status == ehub_algo::SolveStatus::Optimal);

    // size 6 lies on the second segment: 600 + 80 · (6 − 5)
    let result = hub.technology_result("city", "PV").unwrap();
    assert!((result.size - 6.0).abs() < 1e-6);
    assert!((result.capex.value() - 680.0).abs() < 1e-4);
}

#[test]
fn test_technology_errors_name_node_and_technology() {
    let mut data = single_node_case();
    if let Some(tec) = data.technology_data.get_mut("city").and_then(|m| m.get_mut("PV")) {
        tec.size_min = SizeBound::Scalar(12.0);
    }
    let mut hub = EnergyHub::new(data).unwrap();
    let err = hub.construct_model().unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("PV"), "{msg}");
    assert!(msg.contains("city"), "{msg}");
    assert!(!hub.is_constructed());
}
