//! # sceap-core: feeder routing and cable sizing
//!
//! Turns a flat feeder schedule (one row per cable, each naming the load-side
//! `from_bus` and the source-side `to_bus`) into:
//!
//! - a bus hierarchy with levels and structural diagnostics ([`topology`], [`validation`]),
//! - one [`CablePath`] per terminal load, traced back to its supplying root ([`paths`]),
//! - a [`SizingResult`] per feeder: conductor size, runs and voltage drop
//!   checked against ampacity, voltage-drop and short-circuit limits ([`sizing`]).
//!
//! ## Design
//!
//! The bus graph is a petgraph `DiGraph` whose edges run from the load-side bus
//! to the source-side bus and carry the index of the feeder record they came
//! from. It is built once per invocation and shared by hierarchy levelling,
//! validation and path tracing.
//!
//! Nothing in this crate performs I/O or panics on malformed data: structural
//! problems come back as [`Diagnostics`], sizing failures as
//! [`SizingStatus::Failed`] results.
//!
//! ## Quick start
//!
//! ```
//! use sceap_core::*;
//!
//! let records = vec![
//!     FeederRecord::new("C-1", "PUMP-1", "MCC-1").with_load(Kilowatts(30.0)),
//!     FeederRecord::new("C-2", "MCC-1", "TRF-MAIN").with_load(Kilowatts(120.0)),
//! ];
//!
//! let config = EngineConfig::default();
//! let catalog = CableCatalog::builtin();
//! let engine = SizingEngine::new(catalog, &config.sizing);
//!
//! let analysis = discover_paths(&records, &engine, &config);
//! assert_eq!(analysis.paths.len(), 1);
//! assert_eq!(analysis.paths[0].status, PathStatus::Complete);
//! assert_eq!(analysis.paths[0].root_bus, "TRF-MAIN");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod paths;
pub mod sizing;
pub mod topology;
pub mod units;
pub mod validation;

pub use catalog::{CableCatalog, CableCatalogEntry, DeratingTable, TemperatureFactors};
pub use config::{
    CumulativeLoadPolicy, EngineConfig, MarkerMatch, PathOptions, SizingConfig, TopologyOptions,
};
pub use diagnostics::{DiagnosticIssue, Diagnostics, ImportDiagnostics, ImportStats, Severity};
pub use error::{SceapError, SceapResult};
pub use graph_utils::{export_graph, graph_stats, GraphStats};
pub use paths::{
    collapse_parallel, discover_paths, terminal_feeders, trace_to_root, CablePath, PathAnalysis,
    PathStatus, SegmentDrop, Termination, Trace,
};
pub use sizing::{
    size_feeders, DrivingConstraint, SizingEngine, SizingInput, SizingResult, SizingStatus,
};
pub use topology::{BusGraph, BusNode};
pub use units::{Amperes, Kilowatts, Metres, SquareMillimetres, Volts};
pub use validation::{validate, validate_graph, ValidationReport};

/// Canonical form of a bus name: trimmed and ASCII-uppercased.
///
/// All bus comparisons in the crate go through this function, so
/// `" mcc-1"` and `"MCC-1 "` name the same bus.
pub fn normalize_bus(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

/// Error returned when a closed-set label cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLabelError {
    kind: &'static str,
    value: String,
}

impl ParseLabelError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ParseLabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseLabelError {}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Number of cores in one cable, keying the catalog tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CoreConfig {
    #[serde(rename = "1C")]
    OneCore,
    #[serde(rename = "2C")]
    TwoCore,
    #[serde(rename = "3C")]
    ThreeCore,
    #[serde(rename = "4C")]
    FourCore,
}

impl CoreConfig {
    pub const ALL: [CoreConfig; 4] = [
        CoreConfig::OneCore,
        CoreConfig::TwoCore,
        CoreConfig::ThreeCore,
        CoreConfig::FourCore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CoreConfig::OneCore => "1C",
            CoreConfig::TwoCore => "2C",
            CoreConfig::ThreeCore => "3C",
            CoreConfig::FourCore => "4C",
        }
    }

    pub fn is_single_core(&self) -> bool {
        matches!(self, CoreConfig::OneCore)
    }
}

impl fmt::Display for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoreConfig {
    type Err = ParseLabelError;

    /// Accepts `3C`, `3`, `3-core`, `3C+E` (earth conductor ignored) and `3.5C`
    /// (reduced neutral, sized from the 4-core table).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let squashed = squash(s);
        if squashed.starts_with("3.5") {
            return Ok(CoreConfig::FourCore);
        }
        match squashed.chars().next() {
            Some('1') => Ok(CoreConfig::OneCore),
            Some('2') => Ok(CoreConfig::TwoCore),
            Some('3') => Ok(CoreConfig::ThreeCore),
            Some('4') => Ok(CoreConfig::FourCore),
            _ => Err(ParseLabelError::new("core configuration", s)),
        }
    }
}

/// How the cable is laid, selecting the ampacity column and temperature factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InstallationMethod {
    #[default]
    Air,
    Trench,
    Duct,
}

impl InstallationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallationMethod::Air => "air",
            InstallationMethod::Trench => "trench",
            InstallationMethod::Duct => "duct",
        }
    }

    /// Laid in the ground rather than in free air
    pub fn is_buried(&self) -> bool {
        !matches!(self, InstallationMethod::Air)
    }
}

impl fmt::Display for InstallationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallationMethod {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower.contains("duct") || lower.contains("conduit") {
            Ok(InstallationMethod::Duct)
        } else if lower.contains("trench") || lower.contains("buried") || lower.contains("ground")
        {
            Ok(InstallationMethod::Trench)
        } else if lower.contains("air") || lower.contains("tray") || lower.contains("ladder") {
            Ok(InstallationMethod::Air)
        } else {
            Err(ParseLabelError::new("installation method", s))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Phase {
    #[serde(rename = "1ph")]
    Single,
    #[default]
    #[serde(rename = "3ph")]
    Three,
}

impl FromStr for Phase {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let squashed = squash(s);
        if squashed.contains('3') || squashed.starts_with("three") {
            Ok(Phase::Three)
        } else if squashed.contains('1') || squashed.starts_with("single") {
            Ok(Phase::Single)
        } else {
            Err(ParseLabelError::new("phase", s))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConductorMaterial {
    #[default]
    #[serde(rename = "Cu")]
    Copper,
    #[serde(rename = "Al")]
    Aluminium,
}

impl ConductorMaterial {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConductorMaterial::Copper => "Cu",
            ConductorMaterial::Aluminium => "Al",
        }
    }
}

impl FromStr for ConductorMaterial {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "cu" | "copper" => Ok(ConductorMaterial::Copper),
            "al" | "aluminium" | "aluminum" => Ok(ConductorMaterial::Aluminium),
            _ => Err(ParseLabelError::new("conductor material", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Insulation {
    #[default]
    #[serde(rename = "XLPE")]
    Xlpe,
    #[serde(rename = "PVC")]
    Pvc,
}

impl Insulation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Insulation::Xlpe => "XLPE",
            Insulation::Pvc => "PVC",
        }
    }
}

impl FromStr for Insulation {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "xlpe" => Ok(Insulation::Xlpe),
            "pvc" => Ok(Insulation::Pvc),
            _ => Err(ParseLabelError::new("insulation", s)),
        }
    }
}

/// Upstream protective device; only ACBs trigger the short-circuit check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProtectionType {
    Acb,
    #[default]
    Mccb,
    Mcb,
    None,
}

impl ProtectionType {
    pub fn requires_short_circuit_check(&self) -> bool {
        matches!(self, ProtectionType::Acb)
    }
}

impl FromStr for ProtectionType {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "acb" => Ok(ProtectionType::Acb),
            "mccb" => Ok(ProtectionType::Mccb),
            "mcb" => Ok(ProtectionType::Mcb),
            "" | "none" => Ok(ProtectionType::None),
            _ => Err(ParseLabelError::new("protection type", s)),
        }
    }
}

/// Kind of load served, supplying typical power factor and efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LoadType {
    #[default]
    Motor,
    Heater,
    Transformer,
    Feeder,
    Pump,
    Fan,
    Compressor,
}

impl LoadType {
    pub fn typical_power_factor(&self) -> f64 {
        match self {
            LoadType::Motor | LoadType::Pump | LoadType::Fan => 0.85,
            LoadType::Heater => 1.0,
            LoadType::Transformer => 0.95,
            LoadType::Feeder => 0.90,
            LoadType::Compressor => 0.80,
        }
    }

    pub fn typical_efficiency(&self) -> f64 {
        match self {
            LoadType::Motor => 0.92,
            LoadType::Heater => 0.99,
            LoadType::Transformer => 0.97,
            LoadType::Feeder => 1.0,
            LoadType::Pump | LoadType::Fan => 0.88,
            LoadType::Compressor => 0.85,
        }
    }

    /// Rotating loads whose starting current matters for voltage drop
    pub fn is_motor(&self) -> bool {
        matches!(
            self,
            LoadType::Motor | LoadType::Pump | LoadType::Fan | LoadType::Compressor
        )
    }
}

impl FromStr for LoadType {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "motor" | "m" => Ok(LoadType::Motor),
            "heater" => Ok(LoadType::Heater),
            "transformer" => Ok(LoadType::Transformer),
            "feeder" | "f" | "incomer" => Ok(LoadType::Feeder),
            "pump" => Ok(LoadType::Pump),
            "fan" => Ok(LoadType::Fan),
            "compressor" => Ok(LoadType::Compressor),
            _ => Err(ParseLabelError::new("load type", s)),
        }
    }
}

/// Motor starting method, selecting the inrush multiplier and starting drop limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StartingMethod {
    Dol,
    StarDelta,
    SoftStarter,
    Vfd,
}

impl StartingMethod {
    /// Typical starting current as a multiple of full-load current
    pub fn current_multiplier(&self) -> f64 {
        match self {
            StartingMethod::Dol => 6.5,
            StartingMethod::StarDelta => 2.5,
            StartingMethod::SoftStarter => 3.0,
            StartingMethod::Vfd => 1.1,
        }
    }

    /// Permissible voltage drop while starting, in percent
    pub fn drop_limit_percent(&self) -> f64 {
        match self {
            StartingMethod::Dol => 15.0,
            StartingMethod::StarDelta | StartingMethod::SoftStarter => 10.0,
            StartingMethod::Vfd => 5.0,
        }
    }
}

impl FromStr for StartingMethod {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "dol" | "directonline" => Ok(StartingMethod::Dol),
            "stardelta" | "sd" | "y/d" => Ok(StartingMethod::StarDelta),
            "softstarter" | "soft" | "ss" => Ok(StartingMethod::SoftStarter),
            "vfd" | "vsd" | "drive" => Ok(StartingMethod::Vfd),
            _ => Err(ParseLabelError::new("starting method", s)),
        }
    }
}

/// One cable segment of the feeder schedule.
///
/// `from_bus` is the load side, `to_bus` the source side. The trailing
/// optional fields are filled in by later stages: path discovery sets
/// `parallel_count`/`original_cables` on collapsed groups and
/// [`FeederRecord::attach_sizing`] copies a sizing verdict onto the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeederRecord {
    pub cable_number: String,
    #[serde(default)]
    pub serial_no: u32,
    #[serde(default)]
    pub description: String,
    pub from_bus: String,
    pub to_bus: String,
    pub voltage: Volts,
    #[serde(default)]
    pub phase: Phase,
    pub load: Kilowatts,
    #[serde(default)]
    pub power_factor: Option<f64>,
    #[serde(default)]
    pub efficiency: Option<f64>,
    #[serde(default)]
    pub load_type: LoadType,
    pub length: Metres,
    pub core_config: CoreConfig,
    #[serde(default)]
    pub conductor: ConductorMaterial,
    #[serde(default)]
    pub insulation: Insulation,
    #[serde(default)]
    pub installation: InstallationMethod,
    #[serde(default)]
    pub protection: ProtectionType,
    /// Prospective fault current at the upstream switchboard, kA
    #[serde(default)]
    pub short_circuit_ka: Option<f64>,
    /// Protection clearing time, seconds
    #[serde(default)]
    pub clearing_time_s: Option<f64>,
    #[serde(default)]
    pub ambient_temp_c: Option<f64>,
    #[serde(default)]
    pub grouped_circuits: Option<u32>,
    #[serde(default)]
    pub starting_method: Option<StartingMethod>,
    /// Overall derating factor given in the schedule; replaces the tabulated one
    #[serde(default)]
    pub derating_override: Option<f64>,
    #[serde(default)]
    pub ground_temp_c: Option<f64>,
    /// Motor starting (locked-rotor) line current
    #[serde(default)]
    pub starting_current: Option<Amperes>,
    #[serde(default)]
    pub starting_power_factor: Option<f64>,

    #[serde(default)]
    pub derating_factor: Option<f64>,
    #[serde(default = "default_parallel_count")]
    pub parallel_count: u32,
    #[serde(default)]
    pub original_cables: Vec<String>,
    #[serde(default)]
    pub selected_size: Option<SquareMillimetres>,
    #[serde(default)]
    pub number_of_runs: Option<u32>,
    #[serde(default)]
    pub status: Option<SizingStatus>,
}

fn default_parallel_count() -> u32 {
    1
}

impl FeederRecord {
    /// Record with 415 V three-phase, 3-core, in-air defaults and no load
    pub fn new(cable_number: &str, from_bus: &str, to_bus: &str) -> Self {
        Self {
            cable_number: cable_number.to_string(),
            serial_no: 0,
            description: String::new(),
            from_bus: from_bus.to_string(),
            to_bus: to_bus.to_string(),
            voltage: Volts(415.0),
            phase: Phase::Three,
            load: Kilowatts(0.0),
            power_factor: None,
            efficiency: None,
            load_type: LoadType::Motor,
            length: Metres(0.0),
            core_config: CoreConfig::ThreeCore,
            conductor: ConductorMaterial::Copper,
            insulation: Insulation::Xlpe,
            installation: InstallationMethod::Air,
            protection: ProtectionType::Mccb,
            short_circuit_ka: None,
            clearing_time_s: None,
            ambient_temp_c: None,
            grouped_circuits: None,
            starting_method: None,
            derating_override: None,
            ground_temp_c: None,
            starting_current: None,
            starting_power_factor: None,
            derating_factor: None,
            parallel_count: 1,
            original_cables: Vec::new(),
            selected_size: None,
            number_of_runs: None,
            status: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_load(mut self, load: Kilowatts) -> Self {
        self.load = load;
        self
    }

    pub fn with_voltage(mut self, voltage: Volts) -> Self {
        self.voltage = voltage;
        self
    }

    pub fn with_length(mut self, length: Metres) -> Self {
        self.length = length;
        self
    }

    pub fn with_power_factor(mut self, pf: f64, efficiency: f64) -> Self {
        self.power_factor = Some(pf);
        self.efficiency = Some(efficiency);
        self
    }

    pub fn with_cores(mut self, core_config: CoreConfig) -> Self {
        self.core_config = core_config;
        self
    }

    pub fn with_installation(mut self, installation: InstallationMethod) -> Self {
        self.installation = installation;
        self
    }

    pub fn with_load_type(mut self, load_type: LoadType) -> Self {
        self.load_type = load_type;
        self
    }

    pub fn with_short_circuit(mut self, protection: ProtectionType, ka: f64, t_s: f64) -> Self {
        self.protection = protection;
        self.short_circuit_ka = Some(ka);
        self.clearing_time_s = Some(t_s);
        self
    }

    pub fn with_starting_method(mut self, method: StartingMethod) -> Self {
        self.starting_method = Some(method);
        self
    }

    pub fn with_starting_current(mut self, current: Amperes, power_factor: f64) -> Self {
        self.starting_current = Some(current);
        self.starting_power_factor = Some(power_factor);
        self
    }

    pub fn with_derating(mut self, factor: f64) -> Self {
        self.derating_override = Some(factor);
        self
    }

    pub fn from_key(&self) -> String {
        normalize_bus(&self.from_bus)
    }

    pub fn to_key(&self) -> String {
        normalize_bus(&self.to_bus)
    }

    /// Cable numbers this (possibly collapsed) record stands for
    pub fn cables(&self) -> Vec<String> {
        if self.original_cables.is_empty() {
            vec![self.cable_number.clone()]
        } else {
            self.original_cables.clone()
        }
    }

    /// Copy the derived fields of a sizing verdict onto this record
    pub fn attach_sizing(&mut self, result: &SizingResult) {
        self.derating_factor = Some(result.derating_factor);
        self.selected_size = Some(result.selected_size);
        self.number_of_runs = Some(result.number_of_runs);
        self.status = Some(result.status);
    }
}
