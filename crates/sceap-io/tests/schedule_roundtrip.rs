use std::fs;

use sceap_core::{
    discover_paths, size_feeders, validate, Amperes, CableCatalog, EngineConfig, Kilowatts,
    Metres, SizingEngine, SizingStatus,
};
use sceap_io::{read_feeders_csv, write_sizing_csv_file, Field};
use tempfile::tempdir;

const PLANT_SCHEDULE: &str = "\
S.No,Cable Number,Feeder Description,From Bus,To Bus,Voltage (V),Load (kW),Power Factor,Efficiency (%),Load Type,Length (m),No. of Cores,Installation Method,Protection Type,Short Circuit Current (kA),Starting Method
1,INC-01,PMCC incomer,PMCC-1,TRF-01,415,400,0.9,98,Feeder,30,1C,Air,ACB,25,
2,FDR-01,MCC-1 feeder,MCC-1,PMCC-1,415,150,0.85,95,Feeder,80,3C,Air,MCCB,,
3,M-101,Cooling water pump,P-101,MCC-1,415,37,0.86,93,Motor,60,3C,Cable tray,MCCB,,DOL
4,H-201,Tank heater,HTR-201,MCC-1,415,24,,,Heater,150,3C,Trench,MCCB,,
,,,,,,,,,,,,,,,
";

#[test]
fn plant_schedule_imports_and_sizes() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("plant.csv");
    fs::write(&input, PLANT_SCHEDULE).unwrap();

    let import = read_feeders_csv(&input).unwrap();
    assert_eq!(import.records.len(), 4);
    assert_eq!(import.diagnostics.stats.rows, 5);
    assert_eq!(import.diagnostics.stats.skipped_rows, 1);
    assert!(!import.diagnostics.diagnostics.has_errors());
    assert_eq!(import.columns.header(Field::ShortCircuit), Some("Short Circuit Current (kA)"));

    let incomer = &import.records[0];
    assert_eq!(incomer.short_circuit_ka, Some(25.0));
    assert_eq!(incomer.efficiency, Some(0.98));
    let heater = &import.records[3];
    assert_eq!(heater.power_factor, Some(0.85));

    let config = EngineConfig::default();
    assert!(validate(&import.records, &config.topology).is_valid);

    let engine = SizingEngine::new(CableCatalog::builtin(), &config.sizing);
    let analysis = discover_paths(&import.records, &engine, &config);
    assert_eq!(analysis.total_paths, 2);
    assert_eq!(analysis.complete_paths, 2);
    assert!(analysis.paths.iter().all(|p| p.root_bus == "TRF-01"));

    let results = size_feeders(&import.records, &engine);
    assert!(results.iter().all(|r| r.status != SizingStatus::Failed));
    assert!(results[0].size_by_short_circuit.is_some());

    let output = dir.path().join("sizing.csv");
    write_sizing_csv_file(&output, &import.records, &results).unwrap();
    let mut reader = csv::Reader::from_path(&output).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(&rows[2][0], "M-101");
    assert_eq!(&rows[2][1], "P-101");
}

#[test]
fn loosely_labelled_schedule_is_understood() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("loose.csv");
    fs::write(
        &input,
        "Tag No,Source,Destination,Rated Power (kVA),Cable Length Building,Cable Length Riser,Spare 10%,Voltage (kV)\n\
         T-1,M1,SWBD-TRF,50,20,5,2.5,0.415\n",
    )
    .unwrap();

    let import = read_feeders_csv(&input).unwrap();
    assert_eq!(import.records.len(), 1);
    let record = &import.records[0];
    assert_eq!(record.cable_number, "T-1");
    assert_eq!(record.from_bus, "M1");
    assert_eq!(record.to_bus, "SWBD-TRF");
    assert!((record.voltage.value() - 415.0).abs() < 1e-9);
    assert!((record.load.value() - 40.375).abs() < 1e-9);
    assert!((record.length.value() - 27.5).abs() < 1e-9);
}

#[test]
fn camel_case_keys_are_understood() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("keys.csv");
    fs::write(
        &input,
        "cableNumber,fromBus,toBus,loadKW,length,deratingFactor,motorStartingCurrent,motorStartingPF
         C-1,M1,TRF-1,10,50,0.72,120,0.3
",
    )
    .unwrap();

    let import = read_feeders_csv(&input).unwrap();
    assert_eq!(import.columns.header(Field::ToBus), Some("toBus"));
    assert_eq!(import.records.len(), 1);
    let record = &import.records[0];
    assert_eq!(record.cable_number, "C-1");
    assert_eq!(record.from_bus, "M1");
    assert_eq!(record.to_bus, "TRF-1");
    assert_eq!(record.load, Kilowatts(10.0));
    assert_eq!(record.length, Metres(50.0));
    assert_eq!(record.derating_override, Some(0.72));
    assert_eq!(record.starting_current, Some(Amperes(120.0)));
    assert_eq!(record.starting_power_factor, Some(0.3));

    let config = EngineConfig::default();
    let engine = SizingEngine::new(CableCatalog::builtin(), &config.sizing);
    let result = engine.size_record(record);
    assert!((result.derating_factor - 0.72).abs() < 1e-12);
    assert!(result.starting_drop_percent.is_some());
}

#[test]
fn schedule_without_bus_columns_is_rejected() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("bad.csv");
    fs::write(&input, "Cable Number,Load (kW)\nC-1,10\n").unwrap();

    let err = read_feeders_csv(&input).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("bad.csv"));
    assert!(chain.contains("from bus, to bus"));
}
