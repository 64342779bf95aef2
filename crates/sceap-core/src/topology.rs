//! Bus graph built from a flat feeder list.
//!
//! Every feeder record becomes one edge `from_bus → to_bus` (load side to
//! source side) weighted by the record's index in the input slice. Bus names
//! are normalized with [`normalize_bus`] before indexing, and the graph plus its
//! name index are built once and shared by levelling, validation and tracing.

use crate::config::TopologyOptions;
use crate::diagnostics::{DiagnosticIssue, Diagnostics, Severity};
use crate::{normalize_bus, FeederRecord};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// One bus of the single-line diagram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusNode {
    /// Normalized name, the lookup key
    pub name: String,
    /// Name as first written in the input (trimmed)
    pub display_name: String,
    /// Hops from the nearest root; `None` when unreachable from every root
    pub level: Option<usize>,
    /// Buses fed from this one
    pub children: BTreeSet<String>,
    /// Indices of the records leaving this bus towards its source
    pub feeders: Vec<usize>,
    pub is_root: bool,
}

impl BusNode {
    fn new(name: String, display_name: String) -> Self {
        Self {
            name,
            display_name,
            level: None,
            children: BTreeSet::new(),
            feeders: Vec::new(),
            is_root: false,
        }
    }
}

/// Directed bus graph with hierarchy levels
#[derive(Debug, Clone)]
pub struct BusGraph {
    graph: DiGraph<BusNode, usize>,
    index: HashMap<String, NodeIndex>,
    rejected: Vec<usize>,
    diagnostics: Diagnostics,
}

impl BusGraph {
    /// Build the graph and assign levels.
    ///
    /// Records with an empty endpoint or with `from_bus == to_bus` are left
    /// out of the edge set and reported as errors; their non-empty endpoint
    /// names are still registered so they show up as isolated buses.
    pub fn build(records: &[FeederRecord], options: &TopologyOptions) -> Self {
        let mut bus_graph = Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            rejected: Vec::new(),
            diagnostics: Diagnostics::new(),
        };

        for (idx, record) in records.iter().enumerate() {
            let from = record.from_key();
            let to = record.to_key();
            let row = idx + 1;

            if from.is_empty() || to.is_empty() {
                let side = if from.is_empty() { "from" } else { "to" };
                bus_graph.diagnostics.add(
                    DiagnosticIssue::new(
                        Severity::Error,
                        "reference",
                        format!("Cable {} has an empty {} bus", record.cable_number, side),
                    )
                    .with_row(row)
                    .with_entity(record.cable_number.clone()),
                );
                for name in [&record.from_bus, &record.to_bus] {
                    if !name.trim().is_empty() {
                        bus_graph.ensure_node(name);
                    }
                }
                bus_graph.rejected.push(idx);
                continue;
            }

            if from == to {
                bus_graph.diagnostics.add(
                    DiagnosticIssue::new(
                        Severity::Error,
                        "reference",
                        format!(
                            "Cable {} connects bus {} to itself",
                            record.cable_number, from
                        ),
                    )
                    .with_row(row)
                    .with_entity(record.cable_number.clone()),
                );
                bus_graph.ensure_node(&record.from_bus);
                bus_graph.rejected.push(idx);
                continue;
            }

            let from_idx = bus_graph.ensure_node(&record.from_bus);
            let to_idx = bus_graph.ensure_node(&record.to_bus);
            bus_graph.graph[from_idx].feeders.push(idx);
            bus_graph.graph[to_idx].children.insert(from);
            bus_graph.graph.add_edge(from_idx, to_idx, idx);
        }

        bus_graph.mark_roots(options);
        bus_graph.assign_levels();

        for node in bus_graph.graph.node_weights() {
            if node.level.is_none() {
                bus_graph.diagnostics.add_warning_with_entity(
                    "topology",
                    &format!("Bus {} is not reachable from any root", node.display_name),
                    &node.name,
                );
            }
        }

        bus_graph
    }

    fn ensure_node(&mut self, raw_name: &str) -> NodeIndex {
        let key = normalize_bus(raw_name);
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self
            .graph
            .add_node(BusNode::new(key.clone(), raw_name.trim().to_string()));
        self.index.insert(key, idx);
        idx
    }

    fn mark_roots(&mut self, options: &TopologyOptions) {
        for idx in self.graph.node_indices().collect::<Vec<_>>() {
            let named = options.is_root_name(&self.graph[idx].name);
            let has_children = self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .next()
                .is_some();
            let sources_nothing = self
                .graph
                .neighbors_directed(idx, Direction::Outgoing)
                .next()
                .is_none();
            // A bus with no edges at all is isolated, not a source.
            self.graph[idx].is_root = named || (has_children && sources_nothing);
        }
    }

    fn assign_levels(&mut self) {
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        for idx in self.graph.node_indices() {
            if self.graph[idx].is_root {
                queue.push_back(idx);
            }
        }
        for &idx in &queue {
            self.graph[idx].level = Some(0);
        }

        while let Some(parent) = queue.pop_front() {
            let next_level = self.graph[parent].level.map(|l| l + 1).unwrap_or(0);
            let children: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(parent, Direction::Incoming)
                .collect();
            for child in children {
                if self.graph[child].level.is_none() {
                    self.graph[child].level = Some(next_level);
                    queue.push_back(child);
                }
            }
        }
    }

    /// Underlying petgraph graph (edges point towards the source)
    pub fn graph(&self) -> &DiGraph<BusNode, usize> {
        &self.graph
    }

    pub fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(&normalize_bus(name)).copied()
    }

    pub fn node(&self, name: &str) -> Option<&BusNode> {
        self.node_index(name).map(|idx| &self.graph[idx])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &BusNode> {
        self.graph.node_weights()
    }

    pub fn bus_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn feeder_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn level(&self, name: &str) -> Option<usize> {
        self.node(name).and_then(|n| n.level)
    }

    pub fn roots(&self) -> Vec<&BusNode> {
        self.nodes().filter(|n| n.is_root).collect()
    }

    /// Buses that feed something but are fed by nothing: the load ends
    pub fn terminal_buses(&self) -> Vec<&BusNode> {
        self.nodes()
            .filter(|n| !n.feeders.is_empty() && n.children.is_empty())
            .collect()
    }

    /// Record indices of the feeders leaving `name` towards its source
    pub fn feeders_from(&self, name: &str) -> &[usize] {
        self.node(name).map(|n| n.feeders.as_slice()).unwrap_or(&[])
    }

    pub fn children(&self, name: &str) -> Vec<&str> {
        self.node(name)
            .map(|n| n.children.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Buses unreachable from every root
    pub fn disconnected(&self) -> Vec<&BusNode> {
        self.nodes().filter(|n| n.level.is_none()).collect()
    }

    /// Buses without any accepted feeder touching them
    pub fn isolated(&self) -> Vec<&BusNode> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_undirected(idx)
                    .next()
                    .is_none()
            })
            .map(|idx| &self.graph[idx])
            .collect()
    }

    /// Levelled buses ordered by level, then name
    pub fn levels(&self) -> Vec<(&str, usize)> {
        let mut levels: Vec<(&str, usize)> = self
            .nodes()
            .filter_map(|n| n.level.map(|l| (n.display_name.as_str(), l)))
            .collect();
        levels.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        levels
    }

    pub fn max_level(&self) -> Option<usize> {
        self.nodes().filter_map(|n| n.level).max()
    }

    /// Indices of records left out of the graph
    pub fn rejected(&self) -> &[usize] {
        &self.rejected
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}
