use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use sceap_core::{size_feeders, SizingStatus};
use tabwriter::TabWriter;
use tracing::{info, warn};

use super::Session;

pub fn handle(session: &Session, feeders: &Path, out: Option<&PathBuf>) -> Result<()> {
    let import = session.load_feeders(feeders)?;
    let engine = session.engine();
    let results = size_feeders(&import.records, &engine);

    let mut writer = TabWriter::new(io::stdout());
    writeln!(
        writer,
        "CABLE\tFLC (A)\tSIZE (mm²)\tRUNS\tDRIVEN BY\tVD (%)\tSTATUS"
    )?;
    for result in &results {
        writeln!(
            writer,
            "{}\t{:.1}\t{}\t{}\t{}\t{:.2}\t{}",
            result.cable_number,
            result.full_load_current.value(),
            result.selected_size.value(),
            result.number_of_runs,
            result
                .driving_constraint
                .map_or_else(|| "-".to_string(), |c| c.to_string()),
            result.voltage_drop_percent,
            result.status
        )?;
    }
    writer.flush()?;

    for result in &results {
        for warning in &result.warnings {
            warn!("{}: {}", result.cable_number, warning);
        }
    }

    let count = |status: SizingStatus| results.iter().filter(|r| r.status == status).count();
    println!(
        "{} feeder(s): {} approved, {} warning, {} failed",
        results.len(),
        count(SizingStatus::Approved),
        count(SizingStatus::Warning),
        count(SizingStatus::Failed)
    );

    if let Some(path) = out {
        sceap_io::write_sizing_csv_file(path, &import.records, &results)?;
        info!("Cable schedule written to {}", path.display());
        println!("Cable schedule written to {}", path.display());
    }
    Ok(())
}
