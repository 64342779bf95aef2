use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sceap_core::discover_paths;
use tabwriter::TabWriter;
use tracing::{info, warn};

use super::Session;

pub fn handle(session: &Session, feeders: &Path, out: Option<&PathBuf>) -> Result<()> {
    let import = session.load_feeders(feeders)?;
    let engine = session.engine();
    let analysis = discover_paths(&import.records, &engine, &session.config);

    for issue in analysis.diagnostics.iter() {
        warn!("{issue}");
    }

    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "PATH\tSTART\tROOT\tSEGMENTS\tLENGTH (m)\tLOAD (kW)\tDROP (%)\tSTATUS")?;
    for path in &analysis.paths {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{:.1}\t{:.1}\t{:.2}\t{}",
            path.path_id,
            path.start_bus,
            path.root_bus,
            path.segments.len(),
            path.total_length.value(),
            path.cumulative_load.value(),
            path.voltage_drop_percent,
            if path.is_complete() {
                "complete".to_string()
            } else {
                format!("incomplete: {}", path.message)
            }
        )?;
    }
    writer.flush()?;

    println!(
        "{} path(s): {} complete, {} incomplete, average drop {:.2}%",
        analysis.total_paths,
        analysis.complete_paths,
        analysis.incomplete_paths,
        analysis.average_drop_percent
    );
    if !analysis.critical_paths.is_empty() {
        println!(
            "Critical (> {:.1}%): {}",
            session.config.paths.critical_drop_percent,
            analysis.critical_paths.join(", ")
        );
    }

    if let Some(path) = out {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        sceap_io::write_paths_json(BufWriter::new(file), &analysis)?;
        info!("Path report written to {}", path.display());
        println!("Path report written to {}", path.display());
    }
    Ok(())
}
