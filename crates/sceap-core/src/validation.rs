//! Structural validation of a feeder list.
//!
//! Checks, in report order:
//! - records with a missing endpoint or connecting a bus to itself,
//! - buses unreachable from every root,
//! - circular bus references (DFS over `from_bus → to_bus`),
//! - isolated buses,
//! - absence of any root-named bus.
//!
//! Validation never fails; a malformed list is described, not rejected.

use crate::config::TopologyOptions;
use crate::diagnostics::Diagnostics;
use crate::topology::BusGraph;
use crate::FeederRecord;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub diagnostics: Diagnostics,
}

impl ValidationReport {
    /// Human-readable issue lines in report order
    pub fn issues(&self) -> Vec<String> {
        self.diagnostics.messages()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unseen,
    OnStack,
    Done,
}

pub fn validate(records: &[FeederRecord], options: &TopologyOptions) -> ValidationReport {
    let graph = BusGraph::build(records, options);
    validate_graph(&graph, options)
}

/// Validate an already built graph
pub fn validate_graph(graph: &BusGraph, options: &TopologyOptions) -> ValidationReport {
    let mut diagnostics = graph.diagnostics().clone();

    for cycle in find_cycles(graph) {
        let closing = cycle.last().cloned().unwrap_or_default();
        diagnostics.add_error_with_entity(
            "cycle",
            &format!("Circular reference detected: {}", cycle.join(" -> ")),
            &closing,
        );
    }

    for node in graph.isolated() {
        diagnostics.add_warning_with_entity(
            "topology",
            &format!("Bus {} has no connected feeders", node.display_name),
            &node.name,
        );
    }

    if !graph.nodes().any(|n| options.is_root_name(&n.name)) {
        diagnostics.add_error(
            "topology",
            "No transformer or root bus found; expected a bus named with one of the root markers",
        );
    }

    ValidationReport {
        is_valid: diagnostics.is_empty(),
        diagnostics,
    }
}

/// Iterative DFS with an explicit recursion stack. Each back-edge yields the
/// bus sequence from the re-entered bus around to itself.
fn find_cycles(graph: &BusGraph) -> Vec<Vec<String>> {
    let g = graph.graph();
    let mut state = vec![Visit::Unseen; g.node_count()];
    let mut reported: HashSet<NodeIndex> = HashSet::new();
    let mut cycles = Vec::new();

    for start in g.node_indices() {
        if state[start.index()] != Visit::Unseen {
            continue;
        }
        state[start.index()] = Visit::OnStack;
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>)> = vec![(start, g.neighbors(start).collect())];

        while let Some(frame) = stack.last_mut() {
            match frame.1.pop() {
                Some(next) => match state[next.index()] {
                    Visit::Unseen => {
                        state[next.index()] = Visit::OnStack;
                        stack.push((next, g.neighbors(next).collect()));
                    }
                    Visit::OnStack => {
                        if reported.insert(next) {
                            let from = stack.iter().position(|(n, _)| *n == next).unwrap_or(0);
                            let mut names: Vec<String> = stack[from..]
                                .iter()
                                .map(|(n, _)| g[*n].display_name.clone())
                                .collect();
                            names.push(g[next].display_name.clone());
                            cycles.push(names);
                        }
                    }
                    Visit::Done => {}
                },
                None => {
                    if let Some((node, _)) = stack.pop() {
                        state[node.index()] = Visit::Done;
                    }
                }
            }
        }
    }

    cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> TopologyOptions {
        TopologyOptions::default()
    }

    #[test]
    fn test_clean_radial_network_is_valid() {
        let records = vec![
            FeederRecord::new("C-1", "M1", "MCC-1"),
            FeederRecord::new("C-2", "M2", "MCC-1"),
            FeederRecord::new("C-3", "MCC-1", "TRF-MAIN"),
        ];
        let report = validate(&records, &options());
        assert!(report.is_valid, "{:?}", report.issues());
        assert!(report.issues().is_empty());
    }

    #[test]
    fn test_cycle_is_reported_once() {
        let records = vec![
            FeederRecord::new("C-1", "A", "B"),
            FeederRecord::new("C-2", "B", "C"),
            FeederRecord::new("C-3", "C", "A"),
            FeederRecord::new("C-4", "X", "TRF-1"),
        ];
        let report = validate(&records, &options());
        assert!(!report.is_valid);
        let cycles: Vec<_> = report.diagnostics.issues_by_category("cycle").collect();
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].message.contains("A -> B -> C -> A"));
        assert_eq!(cycles[0].severity, crate::diagnostics::Severity::Error);
        assert_eq!(cycles[0].entity.as_deref(), Some("A"));
    }

    #[test]
    fn test_missing_root_is_reported() {
        let records = vec![FeederRecord::new("C-1", "M1", "SWBD")];
        let report = validate(&records, &options());
        assert!(!report.is_valid);
        assert!(report
            .issues()
            .iter()
            .any(|m| m.contains("No transformer or root bus")));
    }

    #[test]
    fn test_missing_endpoint_and_isolated_bus() {
        let records = vec![
            FeederRecord::new("C-1", "M1", "TRF-1"),
            FeederRecord::new("C-2", "STRAY", ""),
        ];
        let report = validate(&records, &options());
        assert!(!report.is_valid);
        let issues = report.issues();
        assert!(issues[0].contains("Cable C-2 has an empty to bus"));
        assert!(issues.iter().any(|m| m.contains("Bus STRAY has no connected feeders")));
    }

    #[test]
    fn test_self_reference_is_error() {
        let records = vec![
            FeederRecord::new("C-1", "M1", "TRF-1"),
            FeederRecord::new("C-2", "M1", " m1"),
        ];
        let report = validate(&records, &options());
        assert!(!report.is_valid);
        assert_eq!(report.diagnostics.error_count(), 1);
    }
}
