use std::fs;

use anyhow::{Context, Result};
use sceap_cli::GraphCommands;
use sceap_core::{export_graph, graph_stats, BusGraph};

use super::Session;

pub fn handle(session: &Session, command: &GraphCommands) -> Result<()> {
    match command {
        GraphCommands::Stats { feeders } => {
            let import = session.load_feeders(feeders)?;
            let graph = BusGraph::build(&import.records, &session.config.topology);
            let stats = graph_stats(&graph);
            println!("Graph statistics for {}:", feeders.display());
            println!("  Buses         : {}", stats.bus_count);
            println!("  Feeders       : {}", stats.feeder_count);
            println!("  Roots         : {}", stats.root_count);
            println!("  Terminals     : {}", stats.terminal_count);
            println!("  Components    : {}", stats.connected_components);
            println!(
                "  Max depth     : {}",
                stats
                    .max_depth
                    .map_or_else(|| "-".to_string(), |d| d.to_string())
            );
            println!("  Max degree    : {}", stats.max_degree);
            println!("  Unreachable   : {}", stats.disconnected_count);
            Ok(())
        }
        GraphCommands::Export {
            feeders,
            format,
            out,
        } => {
            let import = session.load_feeders(feeders)?;
            let graph = BusGraph::build(&import.records, &session.config.topology);
            let rendered = export_graph(&graph, format)?;
            if let Some(path) = out {
                fs::write(path, &rendered)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Graph exported to {}", path.display());
            } else {
                println!("{rendered}");
            }
            Ok(())
        }
    }
}
