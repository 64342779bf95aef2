//! Engine configuration.
//!
//! Every field has a default matching the reference behaviour, so an empty
//! TOML document (or `EngineConfig::default()`) reproduces it exactly.
//!
//! ```
//! use sceap_core::EngineConfig;
//!
//! let config = EngineConfig::default();
//! assert_eq!(config.paths.max_iterations, 100);
//! assert_eq!(config.sizing.running_drop_limit_percent, 5.0);
//! assert!(config.topology.is_root_name("TRF-MAIN"));
//! ```

use crate::normalize_bus;
use serde::{Deserialize, Serialize};

/// Top-level configuration shared by the three engines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub topology: TopologyOptions,
    pub paths: PathOptions,
    pub sizing: SizingConfig,
}

/// Where a root marker must occur in a bus name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarkerMatch {
    /// Name starts with the marker (`TRF-01`, but not `AUX-TRF-FDR`)
    #[default]
    Prefix,
    /// Marker appears anywhere in the name
    Substring,
}

/// How roots (source buses) are recognised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyOptions {
    /// Markers of a source bus, matched on the normalized name
    pub root_markers: Vec<String>,
    pub marker_match: MarkerMatch,
    /// Buses declared as roots regardless of their name
    pub root_buses: Vec<String>,
}

impl Default for TopologyOptions {
    fn default() -> Self {
        Self {
            root_markers: vec!["TRF".to_string(), "TRANSFORMER".to_string()],
            marker_match: MarkerMatch::Prefix,
            root_buses: Vec::new(),
        }
    }
}

impl TopologyOptions {
    /// Whether `name` is a declared root or carries a root marker
    pub fn is_root_name(&self, name: &str) -> bool {
        let key = normalize_bus(name);
        if key.is_empty() {
            return false;
        }
        self.root_buses.iter().any(|r| normalize_bus(r) == key)
            || self
                .root_markers
                .iter()
                .map(|m| normalize_bus(m))
                .filter(|m| !m.is_empty())
                .any(|m| match self.marker_match {
                    MarkerMatch::Prefix => key.starts_with(&m),
                    MarkerMatch::Substring => key.contains(&m),
                })
    }
}

/// Meaning of `CablePath::cumulative_load`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CumulativeLoadPolicy {
    /// Sum of the loads declared on every (collapsed) segment of the path
    #[default]
    SegmentSum,
    /// Load declared on the leaf group only
    LeafOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathOptions {
    /// Hard ceiling on backward traversal steps
    pub max_iterations: usize,
    pub cumulative_load: CumulativeLoadPolicy,
    /// Paths above this aggregate drop are listed as critical
    pub critical_drop_percent: f64,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            cumulative_load: CumulativeLoadPolicy::SegmentSum,
            critical_drop_percent: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    pub running_drop_limit_percent: f64,
    /// Largest conductor considered practical for a single run (mm²)
    pub practical_size_ceiling: f64,
    /// Upper bound when adding parallel runs to meet ampacity
    pub max_parallel_runs: u32,
    /// Add the `X·sinφ` term to voltage drop
    pub include_reactance: bool,
    /// Clearing time used when a fault current is given without one (s)
    pub default_clearing_time_s: f64,
    /// Power factor during motor starting
    pub starting_power_factor: f64,
    /// Ambient temperature the derating table refers to (°C)
    pub reference_ambient_c: f64,
    /// Ground temperature the buried ratings refer to (°C)
    pub reference_ground_c: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            running_drop_limit_percent: 5.0,
            practical_size_ceiling: 240.0,
            max_parallel_runs: 4,
            include_reactance: false,
            default_clearing_time_s: 0.1,
            starting_power_factor: 0.2,
            reference_ambient_c: 55.0,
            reference_ground_c: 20.0,
        }
    }
}
