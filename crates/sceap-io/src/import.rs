use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use sceap_core::diagnostics::ImportDiagnostics;
use sceap_core::FeederRecord;
use tracing::{debug, info};

use crate::normalize::{detect_columns, ColumnMap, Normalizer};
use crate::ImportError;

/// Records read from one feeder schedule, with how they were read
#[derive(Debug, Clone)]
pub struct FeederImport {
    pub records: Vec<FeederRecord>,
    pub columns: ColumnMap,
    pub diagnostics: ImportDiagnostics,
}

/// Read a feeder schedule from CSV text.
///
/// The first record is the header row. Rows may be ragged; missing trailing
/// cells read as empty.
pub fn read_feeders<R: Read>(reader: R) -> Result<FeederImport> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (line, result) in csv_reader.records().enumerate() {
        let record = result.with_context(|| format!("Error reading CSV record {}", line + 1))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<String>>());
    }

    let mut rows = rows.into_iter();
    let headers = rows.next().ok_or(ImportError::NoHeader)?;
    let columns = detect_columns(&headers);
    columns.require_bus_columns()?;
    for (field, header) in columns.mappings() {
        debug!(%field, header, "column mapped");
    }

    let body: Vec<Vec<String>> = rows.collect();
    let normalizer = Normalizer::new(columns.clone());
    let (records, diagnostics) = normalizer.normalize_rows(&body);
    info!(
        feeders = records.len(),
        skipped = diagnostics.stats.skipped_rows,
        defaulted = diagnostics.stats.defaulted_values,
        "feeder schedule normalized"
    );

    Ok(FeederImport {
        records,
        columns,
        diagnostics,
    })
}

/// Read a feeder schedule from a `.csv` file
pub fn read_feeders_csv(path: impl AsRef<Path>) -> Result<FeederImport> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if extension != "csv" && extension != "txt" {
        return Err(ImportError::UnsupportedFormat(extension).into());
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open feeder schedule: {}", path.display()))?;
    read_feeders(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to import {}", path.display()))
}
