use sceap_core::*;

/// Small industrial plant: one transformer, a PMCC and two MCCs, with a
/// dual-fed pump.
fn plant() -> Vec<FeederRecord> {
    vec![
        FeederRecord::new("INC-01", "PMCC-1", "TRF-01")
            .with_description("PMCC incomer")
            .with_load(Kilowatts(400.0))
            .with_length(Metres(30.0))
            .with_cores(CoreConfig::OneCore)
            .with_load_type(LoadType::Feeder)
            .with_short_circuit(ProtectionType::Acb, 25.0, 0.4),
        FeederRecord::new("FDR-01", "MCC-1", "PMCC-1")
            .with_load(Kilowatts(150.0))
            .with_length(Metres(80.0))
            .with_load_type(LoadType::Feeder),
        FeederRecord::new("FDR-02", "MCC-2", "PMCC-1")
            .with_load(Kilowatts(90.0))
            .with_length(Metres(120.0))
            .with_load_type(LoadType::Feeder),
        FeederRecord::new("M-101A", "P-101", "MCC-1")
            .with_description("Cooling water pump")
            .with_load(Kilowatts(37.0))
            .with_power_factor(0.86, 0.93)
            .with_length(Metres(60.0))
            .with_starting_method(StartingMethod::Dol),
        FeederRecord::new("M-101B", "p-101 ", "MCC-1")
            .with_load(Kilowatts(37.0))
            .with_power_factor(0.86, 0.93)
            .with_length(Metres(65.0)),
        FeederRecord::new("M-102", "F-102", "MCC-1")
            .with_load(Kilowatts(15.0))
            .with_length(Metres(45.0)),
        FeederRecord::new("H-201", "HTR-201", "MCC-2")
            .with_load(Kilowatts(24.0))
            .with_load_type(LoadType::Heater)
            .with_length(Metres(150.0))
            .with_installation(InstallationMethod::Trench),
    ]
}

fn engine_for(config: &EngineConfig) -> SizingEngine<'static> {
    SizingEngine::new(CableCatalog::builtin(), &config.sizing)
}

#[test]
fn plant_validates_cleanly() {
    let report = validate(&plant(), &TopologyOptions::default());
    assert!(report.is_valid, "unexpected issues: {:?}", report.issues());
}

#[test]
fn hierarchy_levels_match_single_line_diagram() {
    let graph = BusGraph::build(&plant(), &TopologyOptions::default());
    assert_eq!(graph.level("TRF-01"), Some(0));
    assert_eq!(graph.level("PMCC-1"), Some(1));
    assert_eq!(graph.level("MCC-2"), Some(2));
    assert_eq!(graph.level("P-101"), Some(3));
    assert_eq!(graph.roots().len(), 1);
    assert!(graph.disconnected().is_empty());
}

#[test]
fn every_load_gets_one_complete_path() {
    let config = EngineConfig::default();
    let analysis = discover_paths(&plant(), &engine_for(&config), &config);

    let starts: Vec<&str> = analysis.paths.iter().map(|p| p.start_bus.as_str()).collect();
    assert_eq!(starts, vec!["P-101", "F-102", "HTR-201"]);
    assert_eq!(analysis.complete_paths, 3);
    assert_eq!(analysis.incomplete_paths, 0);

    let pump = analysis.path("PATH-001").unwrap();
    assert_eq!(pump.root_bus, "TRF-01");
    assert_eq!(pump.segments.len(), 3);
    assert_eq!(pump.segments[0].parallel_count, 2);
    assert_eq!(pump.segments[0].load, Kilowatts(74.0));
    assert_eq!(pump.total_length, Metres(65.0 + 80.0 + 30.0));
    assert_eq!(pump.start_description, "Cooling water pump");
    assert_eq!(pump.segment_drops.len(), 3);
    assert!(pump.voltage_drop_percent > 0.0);
}

#[test]
fn marker_inside_a_bus_name_does_not_stop_traversal() {
    let records = vec![
        FeederRecord::new("C-1", "M-1", "AUX-TRF-FDR").with_length(Metres(20.0)),
        FeederRecord::new("C-2", "AUX-TRF-FDR", "TRF-01").with_length(Metres(40.0)),
    ];
    let config = EngineConfig::default();
    let analysis = discover_paths(&records, &engine_for(&config), &config);
    assert_eq!(analysis.paths.len(), 1);
    assert_eq!(analysis.paths[0].root_bus, "TRF-01");
    assert_eq!(analysis.paths[0].segments.len(), 2);
    assert!(analysis.paths[0].is_complete());

    let mut substring = EngineConfig::default();
    substring.topology.marker_match = MarkerMatch::Substring;
    let analysis = discover_paths(&records, &engine_for(&substring), &substring);
    assert_eq!(analysis.paths[0].root_bus, "AUX-TRF-FDR");
    assert_eq!(analysis.paths[0].segments.len(), 1);
}

#[test]
fn collapsed_pump_pair_is_sized_as_two_runs() {
    let config = EngineConfig::default();
    let analysis = discover_paths(&plant(), &engine_for(&config), &config);
    let pump = &analysis.paths[0];
    assert_eq!(pump.segments[0].number_of_runs, Some(2));
    assert_eq!(pump.segment_drops[0].number_of_runs, 2);
}

#[test]
fn batch_sizing_flags_nothing_on_healthy_plant() {
    let config = EngineConfig::default();
    let engine = engine_for(&config);
    let records = plant();
    let results = size_feeders(&records, &engine);

    assert_eq!(results.len(), records.len());
    for result in &results {
        assert_ne!(result.status, SizingStatus::Failed, "{:?}", result.warnings);
        assert!(result.total_installed_rating() >= result.full_load_current);
        let expected = result
            .size_by_ampacity
            .max(result.size_by_voltage_drop)
            .max(result.size_by_short_circuit.unwrap_or_default());
        assert_eq!(result.selected_size, expected);
    }

    let incomer = &results[0];
    assert!(incomer.size_by_short_circuit.is_some());
    assert_eq!(incomer.core_config, CoreConfig::OneCore);
}

#[test]
fn attach_sizing_round_trip_on_records() {
    let config = EngineConfig::default();
    let engine = engine_for(&config);
    let mut records = plant();
    let results = size_feeders(&records, &engine);
    for (record, result) in records.iter_mut().zip(&results) {
        record.attach_sizing(result);
    }
    assert!(records.iter().all(|r| r.selected_size.is_some() && r.status.is_some()));
}

#[test]
fn graph_export_lists_every_bus() {
    let graph = BusGraph::build(&plant(), &TopologyOptions::default());
    let dot = export_graph(&graph, "dot").unwrap();
    for bus in ["TRF-01", "PMCC-1", "MCC-1", "MCC-2", "P-101", "F-102", "HTR-201"] {
        assert!(dot.contains(bus), "missing {bus}");
    }
    let stats = graph_stats(&graph);
    assert_eq!(stats.bus_count, 7);
    assert_eq!(stats.feeder_count, 7);
    assert_eq!(stats.max_depth, Some(3));
}
