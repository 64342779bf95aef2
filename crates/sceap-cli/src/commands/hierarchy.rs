use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use sceap_core::BusGraph;
use tabwriter::TabWriter;

use super::Session;

pub fn handle(session: &Session, feeders: &Path) -> Result<()> {
    let import = session.load_feeders(feeders)?;
    let graph = BusGraph::build(&import.records, &session.config.topology);

    let mut nodes: Vec<_> = graph.nodes().collect();
    nodes.sort_by(|a, b| {
        a.level
            .unwrap_or(usize::MAX)
            .cmp(&b.level.unwrap_or(usize::MAX))
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "BUS\tLEVEL\tROOT\tFEEDERS\tCHILDREN")?;
    for node in nodes {
        let children: Vec<&str> = node.children.iter().map(String::as_str).collect();
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            node.display_name,
            node.level.map_or_else(|| "-".to_string(), |l| l.to_string()),
            if node.is_root { "yes" } else { "" },
            node.feeders.len(),
            children.join(", ")
        )?;
    }
    writer.flush()?;

    for issue in graph.diagnostics().iter() {
        println!("{issue}");
    }
    Ok(())
}
