//! Summary statistics and Graphviz/JSON export of a [`BusGraph`].

use crate::error::{SceapError, SceapResult};
use crate::topology::BusGraph;
use petgraph::algo::connected_components;
use petgraph::visit::EdgeRef;
use serde::Serialize;

/// Shape of a bus hierarchy, as printed by `graph stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub bus_count: usize,
    pub feeder_count: usize,
    pub root_count: usize,
    pub terminal_count: usize,
    pub disconnected_count: usize,
    /// Deepest level reached from any root
    pub max_depth: Option<usize>,
    /// Weakly connected components (one per independent supply system)
    pub connected_components: usize,
    /// Largest number of feeders leaving or entering one bus
    pub max_degree: usize,
}

pub fn graph_stats(graph: &BusGraph) -> GraphStats {
    let g = graph.graph();
    let max_degree = g
        .node_indices()
        .map(|n| g.neighbors_undirected(n).count())
        .max()
        .unwrap_or(0);
    GraphStats {
        bus_count: graph.bus_count(),
        feeder_count: graph.feeder_count(),
        root_count: graph.roots().len(),
        terminal_count: graph.terminal_buses().len(),
        disconnected_count: graph.disconnected().len(),
        max_depth: graph.max_level(),
        connected_components: connected_components(g),
        max_degree,
    }
}

/// Render the bus hierarchy for external tools. Supported formats: `dot`
/// (alias `graphviz`) and `json`.
pub fn export_graph(graph: &BusGraph, format: &str) -> SceapResult<String> {
    match format.to_ascii_lowercase().as_str() {
        "graphviz" | "dot" => Ok(render_dot(graph)),
        "json" => {
            let nodes: Vec<_> = graph.nodes().collect();
            Ok(serde_json::to_string_pretty(&nodes)?)
        }
        other => Err(SceapError::Config(format!(
            "unsupported graph export format '{other}'"
        ))),
    }
}

fn render_dot(graph: &BusGraph) -> String {
    let g = graph.graph();
    let mut buffer = String::new();
    buffer.push_str("digraph feeders {\n  rankdir=BT;\n");
    for node in g.node_indices() {
        let bus = &g[node];
        let level = bus
            .level
            .map(|l| format!("L{l}"))
            .unwrap_or_else(|| "unreached".to_string());
        let shape = if bus.is_root { ", shape=box" } else { "" };
        buffer.push_str(&format!(
            "  n{} [label=\"{}\\n{}\"{}];\n",
            node.index(),
            sanitize_label(&bus.display_name),
            level,
            shape
        ));
    }
    for edge in g.edge_references() {
        let source = edge.source().index();
        let target = edge.target().index();
        buffer.push_str(&format!("  n{source} -> n{target};\n"));
    }
    buffer.push('}');
    buffer
}

fn sanitize_label(label: &str) -> String {
    label.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TopologyOptions;
    use crate::FeederRecord;

    fn sample() -> BusGraph {
        let records = vec![
            FeederRecord::new("C-1", "M1", "MCC-1"),
            FeederRecord::new("C-2", "M2", "MCC-1"),
            FeederRecord::new("C-3", "MCC-1", "TRF-1"),
            FeederRecord::new("C-4", "LONE", "SWBD-2"),
        ];
        BusGraph::build(&records, &TopologyOptions::default())
    }

    #[test]
    fn test_graph_stats() {
        let stats = graph_stats(&sample());
        assert_eq!(stats.bus_count, 6);
        assert_eq!(stats.feeder_count, 4);
        assert_eq!(stats.root_count, 2);
        assert_eq!(stats.terminal_count, 3);
        assert_eq!(stats.max_depth, Some(2));
        assert_eq!(stats.connected_components, 2);
        assert_eq!(stats.max_degree, 3);
        assert_eq!(stats.disconnected_count, 0);
    }

    #[test]
    fn test_dot_export_has_directed_edges() {
        let dot = export_graph(&sample(), "graphviz").unwrap();
        assert!(dot.starts_with("digraph feeders {"));
        assert!(dot.contains("n0 -> n1;"));
        assert!(dot.contains("TRF-1\\nL0\", shape=box"));
        assert!(dot.ends_with('}'));
    }

    #[test]
    fn test_json_export_and_unknown_format() {
        let json = export_graph(&sample(), "JSON").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 6);
        assert!(matches!(
            export_graph(&sample(), "svg"),
            Err(SceapError::Config(_))
        ));
    }
}
