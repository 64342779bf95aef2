//! Result export: sizing schedules as CSV, path analyses as JSON.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sceap_core::{CablePath, FeederRecord, PathAnalysis, SizingResult};
use serde::Serialize;

/// One line of the exported cable schedule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingRow {
    pub cable_number: String,
    pub from_bus: String,
    pub to_bus: String,
    pub description: String,
    pub load_kw: f64,
    pub voltage_v: f64,
    pub length_m: f64,
    pub full_load_current_a: f64,
    pub derating_factor: f64,
    pub size_by_ampacity_mm2: f64,
    pub size_by_voltage_drop_mm2: f64,
    pub size_by_short_circuit_mm2: Option<f64>,
    pub selected_size_mm2: f64,
    pub number_of_runs: u32,
    pub driving_constraint: String,
    pub installed_rating_a: f64,
    pub voltage_drop_v: f64,
    pub voltage_drop_percent: f64,
    pub starting_drop_percent: Option<f64>,
    pub designation: String,
    pub status: String,
    pub warnings: String,
}

impl SizingRow {
    pub fn new(record: &FeederRecord, result: &SizingResult) -> Self {
        Self {
            cable_number: result.cable_number.clone(),
            from_bus: record.from_bus.clone(),
            to_bus: record.to_bus.clone(),
            description: record.description.clone(),
            load_kw: record.load.value(),
            voltage_v: record.voltage.value(),
            length_m: record.length.value(),
            full_load_current_a: round(result.full_load_current.value(), 2),
            derating_factor: round(result.derating_factor, 3),
            size_by_ampacity_mm2: result.size_by_ampacity.value(),
            size_by_voltage_drop_mm2: result.size_by_voltage_drop.value(),
            size_by_short_circuit_mm2: result.size_by_short_circuit.map(|s| s.value()),
            selected_size_mm2: result.selected_size.value(),
            number_of_runs: result.number_of_runs,
            driving_constraint: result
                .driving_constraint
                .map(|c| c.to_string())
                .unwrap_or_default(),
            installed_rating_a: round(result.total_installed_rating().value(), 1),
            voltage_drop_v: round(result.voltage_drop.value(), 2),
            voltage_drop_percent: round(result.voltage_drop_percent, 3),
            starting_drop_percent: result.starting_drop_percent.map(|p| round(p, 2)),
            designation: result.designation.clone(),
            status: result.status.to_string(),
            warnings: result.warnings.join("; "),
        }
    }
}

fn round(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Write one CSV row per sized feeder. `records` and `results` pair up by
/// position, as returned by `size_feeders`.
pub fn write_sizing_csv<W: Write>(
    writer: W,
    records: &[FeederRecord],
    results: &[SizingResult],
) -> Result<()> {
    anyhow::ensure!(
        records.len() == results.len(),
        "{} feeder records but {} sizing results",
        records.len(),
        results.len()
    );
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (record, result) in records.iter().zip(results) {
        csv_writer
            .serialize(SizingRow::new(record, result))
            .with_context(|| format!("Failed to write sizing row for {}", result.cable_number))?;
    }
    csv_writer.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

/// [`write_sizing_csv`] into a file, creating or truncating it
pub fn write_sizing_csv_file(
    path: impl AsRef<Path>,
    records: &[FeederRecord],
    results: &[SizingResult],
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    write_sizing_csv(file, records, results)
}

/// Path analysis as written to disk
#[derive(Debug, Clone, Serialize)]
pub struct PathReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub summary: PathSummary,
    pub paths: &'a [CablePath],
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathSummary {
    pub total_paths: usize,
    pub complete_paths: usize,
    pub incomplete_paths: usize,
    pub average_drop_percent: f64,
    pub critical_paths: Vec<String>,
}

impl<'a> PathReport<'a> {
    pub fn new(analysis: &'a PathAnalysis) -> Self {
        Self {
            generated_at: Utc::now(),
            summary: PathSummary {
                total_paths: analysis.total_paths,
                complete_paths: analysis.complete_paths,
                incomplete_paths: analysis.incomplete_paths,
                average_drop_percent: round(analysis.average_drop_percent, 3),
                critical_paths: analysis.critical_paths.clone(),
            },
            paths: &analysis.paths,
            diagnostics: analysis.diagnostics.messages(),
        }
    }
}

/// Write a path analysis as pretty-printed JSON
pub fn write_paths_json<W: Write>(mut writer: W, analysis: &PathAnalysis) -> Result<()> {
    let report = PathReport::new(analysis);
    serde_json::to_writer_pretty(&mut writer, &report).context("Failed to serialize path report")?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sceap_core::{
        discover_paths, size_feeders, CableCatalog, EngineConfig, Kilowatts, Metres, SizingEngine,
    };

    fn records() -> Vec<FeederRecord> {
        vec![
            FeederRecord::new("C-1", "PUMP-1", "MCC-1")
                .with_description("Feed pump")
                .with_load(Kilowatts(30.0))
                .with_length(Metres(50.0)),
            FeederRecord::new("C-2", "MCC-1", "TRF-1")
                .with_load(Kilowatts(120.0))
                .with_length(Metres(40.0)),
        ]
    }

    #[test]
    fn test_sizing_csv_has_header_and_rows() {
        let config = EngineConfig::default();
        let engine = SizingEngine::new(CableCatalog::builtin(), &config.sizing);
        let records = records();
        let results = size_feeders(&records, &engine);

        let mut buffer = Vec::new();
        write_sizing_csv(&mut buffer, &records, &results).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("cable_number,from_bus,to_bus,description"));
        assert!(lines[1].starts_with("C-1,PUMP-1,MCC-1,Feed pump,30.0"));
        assert!(lines[1].contains("APPROVED"));
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let records = records();
        let err = write_sizing_csv(Vec::new(), &records, &[]).unwrap_err();
        assert!(err.to_string().contains("2 feeder records but 0 sizing results"));
    }

    #[test]
    fn test_paths_json_report() {
        let config = EngineConfig::default();
        let engine = SizingEngine::new(CableCatalog::builtin(), &config.sizing);
        let analysis = discover_paths(&records(), &engine, &config);

        let mut buffer = Vec::new();
        write_paths_json(&mut buffer, &analysis).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["summary"]["total_paths"], 1);
        assert_eq!(value["paths"][0]["path_id"], "PATH-001");
        assert_eq!(value["paths"][0]["root_bus"], "TRF-1");
        assert!(value["generated_at"].is_string());
    }
}
