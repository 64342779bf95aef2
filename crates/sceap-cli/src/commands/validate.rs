use std::path::Path;

use anyhow::{bail, Result};
use sceap_core::validate;
use tracing::info;

use super::Session;

pub fn handle(session: &Session, feeders: &Path, strict: bool, json: bool) -> Result<()> {
    let import = session.load_feeders(feeders)?;
    let report = validate(&import.records, &session.config.topology);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Validation of {} ({} feeders):",
            feeders.display(),
            import.records.len()
        );
        for issue in report.issues() {
            println!("  {issue}");
        }
        println!(
            "  Result        : {}",
            if report.is_valid { "valid" } else { "invalid" }
        );
        println!("  Issues        : {}", report.diagnostics.summary());
    }

    if !report.is_valid && strict {
        bail!(
            "feeder schedule is invalid: {}",
            report.diagnostics.summary()
        );
    }
    info!("Validation finished");
    Ok(())
}
