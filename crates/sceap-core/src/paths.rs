//! Path discovery: one route per terminal load, traced back to its source.
//!
//! Terminal feeders (whose `from_bus` never appears as a `to_bus`) are grouped
//! by load bus so that redundant A/B cables count as one logical segment
//! carrying their combined load. Each group is then walked towards the source
//! by repeatedly following the feeder that leaves the current `to_bus`.
//!
//! The walk stops at the first root-named bus (complete path), at a bus no
//! feeder leaves (dead end), at a bus it has already visited (cycle), or after
//! [`PathOptions::max_iterations`](crate::PathOptions) steps. Incomplete paths
//! are still returned with a status message.

use crate::config::{CumulativeLoadPolicy, EngineConfig};
use crate::diagnostics::{DiagnosticIssue, Diagnostics, Severity};
use crate::sizing::{SizingEngine, SizingStatus};
use crate::topology::BusGraph;
use crate::units::{Amperes, Kilowatts, Metres, SquareMillimetres, Volts};
use crate::FeederRecord;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStatus {
    Complete,
    Incomplete,
}

/// Why a backward walk stopped; each variant names the last bus reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Termination {
    RootReached(String),
    DeadEnd(String),
    Cycle(String),
    IterationLimit(String),
}

impl Termination {
    pub fn bus(&self) -> &str {
        match self {
            Termination::RootReached(b)
            | Termination::DeadEnd(b)
            | Termination::Cycle(b)
            | Termination::IterationLimit(b) => b,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Termination::RootReached(_))
    }
}

/// Ordered segments from the load towards the source
#[derive(Debug, Clone)]
pub struct Trace {
    pub segments: Vec<FeederRecord>,
    pub termination: Termination,
    pub diagnostics: Diagnostics,
}

/// Voltage drop contribution of one path segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentDrop {
    pub cable_number: String,
    pub from_bus: String,
    pub to_bus: String,
    pub length: Metres,
    pub selected_size: SquareMillimetres,
    pub number_of_runs: u32,
    pub resistance_ohm_per_km: f64,
    /// Current per run
    pub current: Amperes,
    pub voltage_drop: Volts,
    pub voltage_drop_percent: f64,
    pub status: SizingStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CablePath {
    pub path_id: String,
    pub start_bus: String,
    pub start_description: String,
    pub root_bus: String,
    pub segments: Vec<FeederRecord>,
    pub total_length: Metres,
    /// Voltage of the leaf segment
    pub total_voltage: Volts,
    pub cumulative_load: Kilowatts,
    pub voltage_drop: Volts,
    pub voltage_drop_percent: f64,
    pub segment_drops: Vec<SegmentDrop>,
    pub status: PathStatus,
    pub message: String,
}

impl CablePath {
    pub fn is_complete(&self) -> bool {
        self.status == PathStatus::Complete
    }

    /// Cable numbers in path order, with parallel groups expanded
    pub fn cable_numbers(&self) -> Vec<String> {
        self.segments.iter().flat_map(FeederRecord::cables).collect()
    }
}

/// All discovered paths with summary figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathAnalysis {
    pub paths: Vec<CablePath>,
    pub total_paths: usize,
    pub complete_paths: usize,
    pub incomplete_paths: usize,
    pub average_drop_percent: f64,
    /// Ids of paths whose aggregate drop exceeds the critical threshold
    pub critical_paths: Vec<String>,
    pub diagnostics: Diagnostics,
}

impl PathAnalysis {
    fn summarize(paths: Vec<CablePath>, critical_drop_percent: f64, diagnostics: Diagnostics) -> Self {
        let complete_paths = paths.iter().filter(|p| p.is_complete()).count();
        let average_drop_percent = if paths.is_empty() {
            0.0
        } else {
            paths.iter().map(|p| p.voltage_drop_percent).sum::<f64>() / paths.len() as f64
        };
        let critical_paths = paths
            .iter()
            .filter(|p| p.voltage_drop_percent > critical_drop_percent)
            .map(|p| p.path_id.clone())
            .collect();
        Self {
            total_paths: paths.len(),
            incomplete_paths: paths.len() - complete_paths,
            complete_paths,
            average_drop_percent,
            critical_paths,
            paths,
            diagnostics,
        }
    }

    pub fn path(&self, path_id: &str) -> Option<&CablePath> {
        self.paths.iter().find(|p| p.path_id == path_id)
    }
}

/// Merge records that run between the same buses into one logical record.
///
/// The merged record keeps the first record's identity and source bus, sums
/// the loads, keeps the longest length and lists every cable it stands for.
/// A group whose members name different source buses is still merged, with a
/// warning. Returns `None` for an empty group.
pub fn collapse_parallel(
    group: &[&FeederRecord],
    diagnostics: &mut Diagnostics,
) -> Option<FeederRecord> {
    let (first, rest) = group.split_first()?;
    let mut merged = (*first).clone();
    if rest.is_empty() {
        merged.original_cables = first.cables();
        return Some(merged);
    }

    let first_to = first.to_key();
    if rest.iter().any(|r| r.to_key() != first_to) {
        diagnostics.add(
            DiagnosticIssue::new(
                Severity::Warning,
                "path",
                format!(
                    "Parallel feeders from {} name different source buses; following {}",
                    first.from_bus.trim(),
                    first.to_bus.trim()
                ),
            )
            .with_entity(first.from_key()),
        );
    }

    merged.load = group.iter().map(|r| r.load).sum();
    merged.length = group
        .iter()
        .map(|r| r.length)
        .fold(Metres(0.0), Metres::max);
    merged.parallel_count = group.iter().map(|r| r.parallel_count.max(1)).sum();
    merged.original_cables = group.iter().flat_map(|r| r.cables()).collect();
    Some(merged)
}

/// Terminal feeder groups, one per load bus, in first-seen order
pub fn terminal_feeders<'r>(
    records: &'r [FeederRecord],
    graph: &BusGraph,
) -> Vec<Vec<&'r FeederRecord>> {
    graph
        .terminal_buses()
        .into_iter()
        .map(|bus| bus.feeders.iter().map(|&i| &records[i]).collect())
        .collect()
}

/// Walk from `start` towards the source.
///
/// The visited set is seeded with the start bus. When several feeders leave a
/// bus, those towards the first feeder's source bus are collapsed into one
/// segment and the others are ignored with a warning.
pub fn trace_to_root(
    start: &FeederRecord,
    records: &[FeederRecord],
    graph: &BusGraph,
    config: &EngineConfig,
) -> Trace {
    let mut diagnostics = Diagnostics::new();
    let mut segments = vec![start.clone()];
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.from_key());

    for _ in 0..config.paths.max_iterations {
        let current = &segments[segments.len() - 1];
        let bus = current.to_key();
        let display = current.to_bus.trim().to_string();

        if config.topology.is_root_name(&bus) {
            return Trace {
                segments,
                termination: Termination::RootReached(display),
                diagnostics,
            };
        }
        if !visited.insert(bus.clone()) {
            return Trace {
                segments,
                termination: Termination::Cycle(display),
                diagnostics,
            };
        }

        let parents: Vec<&FeederRecord> = graph
            .feeders_from(&bus)
            .iter()
            .map(|&i| &records[i])
            .collect();
        let Some(first) = parents.first() else {
            return Trace {
                segments,
                termination: Termination::DeadEnd(display),
                diagnostics,
            };
        };

        let source = first.to_key();
        let (same_source, other): (Vec<&FeederRecord>, Vec<&FeederRecord>) =
            parents.iter().copied().partition(|r| r.to_key() == source);
        if !other.is_empty() {
            diagnostics.add(
                DiagnosticIssue::new(
                    Severity::Warning,
                    "path",
                    format!(
                        "Bus {} is fed from {} sources; following {}",
                        display,
                        other.len() + 1,
                        first.to_bus.trim()
                    ),
                )
                .with_entity(bus.clone()),
            );
        }

        match collapse_parallel(&same_source, &mut diagnostics) {
            Some(segment) => segments.push(segment),
            None => break,
        }
    }

    let last = segments[segments.len() - 1].to_bus.trim().to_string();
    Trace {
        segments,
        termination: Termination::IterationLimit(last),
        diagnostics,
    }
}

/// Discover and annotate one path per terminal load bus.
///
/// Every segment is sized with `engine`; its running voltage drop feeds the
/// path aggregate and its verdict is attached to the segment record.
pub fn discover_paths(
    records: &[FeederRecord],
    engine: &SizingEngine<'_>,
    config: &EngineConfig,
) -> PathAnalysis {
    let graph = BusGraph::build(records, &config.topology);
    let mut diagnostics = graph.diagnostics().clone();
    let mut paths = Vec::new();

    for group in terminal_feeders(records, &graph) {
        let Some(leaf) = collapse_parallel(&group, &mut diagnostics) else {
            continue;
        };
        let trace = trace_to_root(&leaf, records, &graph, config);
        diagnostics.merge(trace.diagnostics.clone());

        let path_id = format!("PATH-{:03}", paths.len() + 1);
        let path = annotate(path_id, trace, engine, config);
        if !path.is_complete() {
            diagnostics.add(
                DiagnosticIssue::new(Severity::Warning, "path", path.message.clone())
                    .with_entity(path.path_id.clone()),
            );
        }
        paths.push(path);
    }

    if paths.is_empty() && !records.is_empty() {
        diagnostics.add_warning(
            "path",
            "Feeder records are present but no path was discovered; check bus names for circular references",
        );
    }

    PathAnalysis::summarize(paths, config.paths.critical_drop_percent, diagnostics)
}

fn annotate(
    path_id: String,
    trace: Trace,
    engine: &SizingEngine<'_>,
    config: &EngineConfig,
) -> CablePath {
    let Trace {
        mut segments,
        termination,
        ..
    } = trace;

    let mut segment_drops = Vec::with_capacity(segments.len());
    for segment in segments.iter_mut() {
        let result = engine.size_record(segment);
        segment.attach_sizing(&result);
        segment_drops.push(SegmentDrop {
            cable_number: segment.cable_number.clone(),
            from_bus: segment.from_bus.trim().to_string(),
            to_bus: segment.to_bus.trim().to_string(),
            length: segment.length,
            selected_size: result.selected_size,
            number_of_runs: result.number_of_runs,
            resistance_ohm_per_km: result.resistance_ohm_per_km,
            current: result.full_load_current / f64::from(result.number_of_runs.max(1)),
            voltage_drop: result.voltage_drop,
            voltage_drop_percent: result.voltage_drop_percent,
            status: result.status,
        });
    }

    let leaf = &segments[0];
    let total_voltage = leaf.voltage;
    let total_length: Metres = segments.iter().map(|s| s.length).sum();
    let cumulative_load = match config.paths.cumulative_load {
        CumulativeLoadPolicy::SegmentSum => segments.iter().map(|s| s.load).sum(),
        CumulativeLoadPolicy::LeafOnly => leaf.load,
    };
    let voltage_drop: Volts = segment_drops.iter().map(|d| d.voltage_drop).sum();
    let voltage_drop_percent = total_voltage.percent_of(voltage_drop);

    let start_bus = leaf.from_bus.trim().to_string();
    let start_description = leaf.description.clone();
    let hops = segments.len();
    let (status, message) = match &termination {
        Termination::RootReached(root) => (
            PathStatus::Complete,
            format!("Complete path from {start_bus} to {root} in {hops} segment(s)"),
        ),
        Termination::DeadEnd(bus) => (
            PathStatus::Incomplete,
            format!("Incomplete path from {start_bus}: no feeder supplies bus {bus}"),
        ),
        Termination::Cycle(bus) => (
            PathStatus::Incomplete,
            format!("Incomplete path from {start_bus}: circular reference at bus {bus}"),
        ),
        Termination::IterationLimit(bus) => (
            PathStatus::Incomplete,
            format!(
                "Incomplete path from {start_bus}: stopped at {bus} after {} steps",
                config.paths.max_iterations
            ),
        ),
    };

    CablePath {
        path_id,
        start_bus,
        start_description,
        root_bus: termination.bus().to_string(),
        segments,
        total_length,
        total_voltage,
        cumulative_load,
        voltage_drop,
        voltage_drop_percent,
        segment_drops,
        status,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CableCatalog;
    use crate::config::PathOptions;

    fn run(records: &[FeederRecord], config: &EngineConfig) -> PathAnalysis {
        let engine = SizingEngine::new(CableCatalog::builtin(), &config.sizing);
        discover_paths(records, &engine, config)
    }

    #[test]
    fn test_duplicate_leaf_feeders_collapse_into_one_segment() {
        let records = vec![
            FeederRecord::new("C-A1", "A", "B")
                .with_load(Kilowatts(10.0))
                .with_length(Metres(40.0)),
            FeederRecord::new("C-B", "B", "TRF-MAIN")
                .with_load(Kilowatts(50.0))
                .with_length(Metres(100.0)),
            FeederRecord::new("C-A2", "A", "B")
                .with_load(Kilowatts(10.0))
                .with_length(Metres(55.0)),
        ];
        let analysis = run(&records, &EngineConfig::default());

        assert_eq!(analysis.total_paths, 1);
        let path = &analysis.paths[0];
        assert_eq!(path.path_id, "PATH-001");
        assert_eq!(path.status, PathStatus::Complete);
        assert_eq!(path.root_bus, "TRF-MAIN");
        assert_eq!(path.segments.len(), 2);
        assert_eq!(path.segments[0].parallel_count, 2);
        assert_eq!(path.segments[0].load, Kilowatts(20.0));
        assert_eq!(path.segments[0].original_cables, vec!["C-A1", "C-A2"]);
        assert_eq!(path.total_length, Metres(155.0));
        assert_eq!(path.cumulative_load, Kilowatts(70.0));
        assert_eq!(path.cable_numbers(), vec!["C-A1", "C-A2", "C-B"]);
    }

    #[test]
    fn test_collapse_sums_load_and_counts_members() {
        let a = FeederRecord::new("C-1", "M", "P").with_load(Kilowatts(10.0));
        let b = FeederRecord::new("C-2", "m ", "p").with_load(Kilowatts(10.0));
        let mut diag = Diagnostics::new();
        let merged = collapse_parallel(&[&a, &b], &mut diag).unwrap();
        assert_eq!(merged.parallel_count, 2);
        assert_eq!(merged.load, Kilowatts(20.0));
        assert!(diag.is_empty());
        assert!(collapse_parallel(&[], &mut diag).is_none());
    }

    #[test]
    fn test_collapse_warns_on_differing_sources() {
        let a = FeederRecord::new("C-1", "M", "P1");
        let b = FeederRecord::new("C-2", "M", "P2");
        let mut diag = Diagnostics::new();
        let merged = collapse_parallel(&[&a, &b], &mut diag).unwrap();
        assert_eq!(merged.to_bus, "P1");
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_every_leaf_reaches_single_root() {
        let records = vec![
            FeederRecord::new("C-1", "M1", "MCC-1").with_length(Metres(20.0)),
            FeederRecord::new("C-2", "M2", "MCC-1").with_length(Metres(30.0)),
            FeederRecord::new("C-3", "M3", "MCC-2").with_length(Metres(25.0)),
            FeederRecord::new("C-4", "MCC-1", "PMCC").with_length(Metres(60.0)),
            FeederRecord::new("C-5", "MCC-2", "PMCC").with_length(Metres(80.0)),
            FeederRecord::new("C-6", "PMCC", "TRF-1").with_length(Metres(15.0)),
        ];
        let analysis = run(&records, &EngineConfig::default());

        assert_eq!(analysis.total_paths, 3);
        assert_eq!(analysis.complete_paths, 3);
        for path in &analysis.paths {
            assert!(path.is_complete());
            assert_eq!(path.segments.last().unwrap().to_key(), "TRF-1");
            for pair in path.segments.windows(2) {
                assert_eq!(pair[0].to_key(), pair[1].from_key());
            }
        }
        assert_eq!(analysis.paths[2].total_length, Metres(120.0));
    }

    #[test]
    fn test_cycle_terminates_incomplete() {
        let records = vec![
            FeederRecord::new("C-1", "A", "B"),
            FeederRecord::new("C-2", "B", "C"),
            FeederRecord::new("C-3", "C", "A"),
        ];
        let config = EngineConfig::default();
        let graph = BusGraph::build(&records, &config.topology);

        for start in &records {
            let trace = trace_to_root(start, &records, &graph, &config);
            assert!(matches!(trace.termination, Termination::Cycle(_)));
            assert_eq!(trace.segments.len(), 3);
        }

        let analysis = run(&records, &config);
        assert!(analysis.paths.is_empty());
        assert!(analysis
            .diagnostics
            .messages()
            .iter()
            .any(|m| m.contains("no path was discovered")));
    }

    #[test]
    fn test_iteration_ceiling_bounds_traversal() {
        let records: Vec<FeederRecord> = (0..10)
            .map(|i| FeederRecord::new(&format!("C-{i}"), &format!("B{i}"), &format!("B{}", i + 1)))
            .collect();
        let config = EngineConfig {
            paths: PathOptions {
                max_iterations: 3,
                ..PathOptions::default()
            },
            ..EngineConfig::default()
        };
        let graph = BusGraph::build(&records, &config.topology);
        let trace = trace_to_root(&records[0], &records, &graph, &config);
        assert!(matches!(trace.termination, Termination::IterationLimit(_)));
        assert_eq!(trace.segments.len(), 4);
    }

    #[test]
    fn test_dead_end_is_incomplete_with_effective_root() {
        let records = vec![
            FeederRecord::new("C-1", "M1", "MCC-1"),
            FeederRecord::new("C-2", "MCC-1", "SWBD"),
        ];
        let analysis = run(&records, &EngineConfig::default());
        let path = &analysis.paths[0];
        assert_eq!(path.status, PathStatus::Incomplete);
        assert_eq!(path.root_bus, "SWBD");
        assert!(path.message.contains("no feeder supplies bus SWBD"));
        assert_eq!(analysis.incomplete_paths, 1);
    }

    #[test]
    fn test_leaf_only_load_policy() {
        let records = vec![
            FeederRecord::new("C-1", "M1", "MCC-1").with_load(Kilowatts(15.0)),
            FeederRecord::new("C-2", "MCC-1", "TRF-1").with_load(Kilowatts(90.0)),
        ];
        let mut config = EngineConfig::default();
        assert_eq!(run(&records, &config).paths[0].cumulative_load, Kilowatts(105.0));
        config.paths.cumulative_load = CumulativeLoadPolicy::LeafOnly;
        assert_eq!(run(&records, &config).paths[0].cumulative_load, Kilowatts(15.0));
    }

    #[test]
    fn test_path_drop_is_sum_of_segment_drops() {
        let records = vec![
            FeederRecord::new("C-1", "M1", "MCC-1")
                .with_load(Kilowatts(30.0))
                .with_length(Metres(80.0)),
            FeederRecord::new("C-2", "MCC-1", "TRF-1")
                .with_load(Kilowatts(30.0))
                .with_length(Metres(120.0)),
        ];
        let analysis = run(&records, &EngineConfig::default());
        let path = &analysis.paths[0];
        let sum: f64 = path.segment_drops.iter().map(|d| d.voltage_drop.value()).sum();
        assert!((path.voltage_drop.value() - sum).abs() < 1e-9);
        assert!((path.voltage_drop_percent - sum / 415.0 * 100.0).abs() < 1e-9);
        assert!(path.segments.iter().all(|s| s.selected_size.is_some()));
    }

    #[test]
    fn test_critical_paths_listed() {
        let records = vec![FeederRecord::new("C-1", "M1", "TRF-1")
            .with_load(Kilowatts(200.0))
            .with_length(Metres(2000.0))];
        let analysis = run(&records, &EngineConfig::default());
        assert_eq!(analysis.critical_paths, vec!["PATH-001"]);
        assert!(analysis.average_drop_percent > 3.0);
    }
}
