//! Cable Sizing Engine.
//!
//! For one feeder the engine picks the smallest catalog conductor, and the
//! number of parallel runs, that satisfies three independent constraints:
//!
//! 1. **Ampacity**: derated catalog rating ≥ current per run.
//! 2. **Voltage drop**: running drop ≤ limit (default 5 %), and for motors
//!    with a known starting method the starting drop ≤ that method's limit.
//! 3. **Short-circuit withstand** (ACB-protected feeders with a fault level):
//!    `A ≥ Isc / (k·√t)`.
//!
//! The selected size is the maximum of the three. A constraint that no catalog
//! size meets falls back to the largest size and the verdict stage reports the
//! shortfall. Lookup failures never escape [`SizingEngine::size`]; they turn
//! into [`SizingStatus::Failed`] results so one bad feeder cannot stop a batch.
//!
//! ```
//! use sceap_core::*;
//!
//! let catalog = CableCatalog::builtin();
//! let config = SizingConfig::default();
//! let engine = SizingEngine::new(catalog, &config);
//!
//! let record = FeederRecord::new("C-1", "PUMP-1", "MCC-1")
//!     .with_load(Kilowatts(75.0))
//!     .with_power_factor(0.85, 0.90)
//!     .with_length(Metres(95.0));
//! let result = engine.size(&SizingInput::from_record(&record));
//!
//! assert_eq!(result.selected_size, SquareMillimetres(35.0));
//! assert_eq!(result.driving_constraint, Some(DrivingConstraint::Ampacity));
//! assert_eq!(result.status, SizingStatus::Approved);
//! ```

use crate::catalog::{CableCatalog, CableCatalogEntry};
use crate::config::SizingConfig;
use crate::error::{SceapError, SceapResult};
use crate::units::{Amperes, Kilowatts, Metres, SquareMillimetres, Volts};
use crate::{
    ConductorMaterial, CoreConfig, FeederRecord, InstallationMethod, Insulation, LoadType, Phase,
    ProtectionType, StartingMethod,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Overall verdict of one sizing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SizingStatus {
    Approved,
    Warning,
    Failed,
}

impl SizingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizingStatus::Approved => "APPROVED",
            SizingStatus::Warning => "WARNING",
            SizingStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for SizingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint that determined the selected size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrivingConstraint {
    Ampacity,
    VoltageDrop,
    ShortCircuit,
}

impl DrivingConstraint {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrivingConstraint::Ampacity => "Ampacity",
            DrivingConstraint::VoltageDrop => "Voltage Drop",
            DrivingConstraint::ShortCircuit => "Short Circuit",
        }
    }
}

impl std::fmt::Display for DrivingConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Electrical and installation parameters of one feeder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingInput {
    pub cable_number: String,
    pub load_type: LoadType,
    pub load: Kilowatts,
    pub voltage: Volts,
    pub phase: Phase,
    pub power_factor: Option<f64>,
    pub efficiency: Option<f64>,
    pub cores: CoreConfig,
    pub conductor: ConductorMaterial,
    pub insulation: Insulation,
    pub installation: InstallationMethod,
    pub length: Metres,
    pub ambient_temp_c: Option<f64>,
    pub grouped_circuits: Option<u32>,
    pub protection: ProtectionType,
    /// Fault current, kA
    pub short_circuit_ka: Option<f64>,
    pub clearing_time_s: Option<f64>,
    pub starting_method: Option<StartingMethod>,
    pub derating_override: Option<f64>,
    pub ground_temp_c: Option<f64>,
    /// Locked-rotor current of the whole feeder, split evenly across runs
    pub starting_current: Option<Amperes>,
    pub starting_power_factor: Option<f64>,
    /// Runs the feeder is already built with (collapsed parallel groups)
    pub min_runs: u32,
}

impl SizingInput {
    pub fn from_record(record: &FeederRecord) -> Self {
        Self {
            cable_number: record.cable_number.clone(),
            load_type: record.load_type,
            load: record.load,
            voltage: record.voltage,
            phase: record.phase,
            power_factor: record.power_factor,
            efficiency: record.efficiency,
            cores: record.core_config,
            conductor: record.conductor,
            insulation: record.insulation,
            installation: record.installation,
            length: record.length,
            ambient_temp_c: record.ambient_temp_c,
            grouped_circuits: record.grouped_circuits,
            protection: record.protection,
            short_circuit_ka: record.short_circuit_ka,
            clearing_time_s: record.clearing_time_s,
            starting_method: record.starting_method,
            derating_override: record.derating_override,
            ground_temp_c: record.ground_temp_c,
            starting_current: record.starting_current,
            starting_power_factor: record.starting_power_factor,
            min_runs: record.parallel_count.max(1),
        }
    }

    fn power_factor_or_typical(&self) -> f64 {
        self.power_factor
            .filter(|pf| *pf > 0.0 && *pf <= 1.0)
            .unwrap_or_else(|| self.load_type.typical_power_factor())
    }

    fn efficiency_or_typical(&self) -> f64 {
        self.efficiency
            .filter(|eta| *eta > 0.0 && *eta <= 1.0)
            .unwrap_or_else(|| self.load_type.typical_efficiency())
    }
}

/// Outcome of sizing one feeder; never mutated after creation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingResult {
    pub cable_number: String,
    pub core_config: CoreConfig,
    pub full_load_current: Amperes,
    pub derating_factor: f64,
    /// Current per run divided by the derating factor
    pub derated_current: Amperes,
    pub size_by_ampacity: SquareMillimetres,
    pub size_by_voltage_drop: SquareMillimetres,
    pub size_by_short_circuit: Option<SquareMillimetres>,
    pub selected_size: SquareMillimetres,
    pub driving_constraint: Option<DrivingConstraint>,
    pub number_of_runs: u32,
    pub catalog_rating: Amperes,
    /// Derated rating of one run
    pub installed_rating: Amperes,
    pub resistance_ohm_per_km: f64,
    pub voltage_drop: Volts,
    pub voltage_drop_percent: f64,
    pub starting_drop_percent: Option<f64>,
    pub designation: String,
    pub status: SizingStatus,
    pub warnings: Vec<String>,
}

impl SizingResult {
    fn pending(input: &SizingInput) -> Self {
        Self {
            cable_number: input.cable_number.clone(),
            core_config: input.cores,
            full_load_current: Amperes(0.0),
            derating_factor: 1.0,
            derated_current: Amperes(0.0),
            size_by_ampacity: SquareMillimetres(0.0),
            size_by_voltage_drop: SquareMillimetres(0.0),
            size_by_short_circuit: None,
            selected_size: SquareMillimetres(0.0),
            driving_constraint: None,
            number_of_runs: input.min_runs.max(1),
            catalog_rating: Amperes(0.0),
            installed_rating: Amperes(0.0),
            resistance_ohm_per_km: 0.0,
            voltage_drop: Volts(0.0),
            voltage_drop_percent: 0.0,
            starting_drop_percent: None,
            designation: String::new(),
            status: SizingStatus::Approved,
            warnings: Vec::new(),
        }
    }

    /// Installed ampacity across all runs
    pub fn total_installed_rating(&self) -> Amperes {
        self.installed_rating * f64::from(self.number_of_runs)
    }

    fn raise(&mut self, status: SizingStatus) {
        let rank = |s: SizingStatus| match s {
            SizingStatus::Approved => 0,
            SizingStatus::Warning => 1,
            SizingStatus::Failed => 2,
        };
        if rank(status) > rank(self.status) {
            self.status = status;
        }
    }
}

/// Material/insulation constant `k` for the adiabatic withstand equation
pub fn short_circuit_constant(material: ConductorMaterial, insulation: Insulation) -> f64 {
    match (material, insulation) {
        (ConductorMaterial::Copper, Insulation::Xlpe) => 143.0,
        (ConductorMaterial::Copper, Insulation::Pvc) => 115.0,
        (ConductorMaterial::Aluminium, Insulation::Xlpe) => 94.0,
        (ConductorMaterial::Aluminium, Insulation::Pvc) => 76.0,
    }
}

/// Full-load line current drawn by `load` at `voltage`
pub fn full_load_current(
    load: Kilowatts,
    voltage: Volts,
    phase: Phase,
    power_factor: f64,
    efficiency: f64,
) -> Amperes {
    let watts = load.value() * 1000.0;
    let denominator = match phase {
        Phase::Three => 3f64.sqrt() * voltage.value() * power_factor * efficiency,
        Phase::Single => voltage.value() * power_factor * efficiency,
    };
    Amperes(watts / denominator)
}

/// Sizes feeders against one catalog with one configuration
#[derive(Debug, Clone)]
pub struct SizingEngine<'a> {
    catalog: &'a CableCatalog,
    config: SizingConfig,
}

impl<'a> SizingEngine<'a> {
    pub fn new(catalog: &'a CableCatalog, config: &SizingConfig) -> Self {
        Self {
            catalog,
            config: config.clone(),
        }
    }

    pub fn catalog(&self) -> &CableCatalog {
        self.catalog
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    pub fn size_record(&self, record: &FeederRecord) -> SizingResult {
        self.size(&SizingInput::from_record(record))
    }

    /// Size one feeder. Never fails: lookup and input errors become a
    /// `FAILED` result carrying the error text.
    pub fn size(&self, input: &SizingInput) -> SizingResult {
        let mut result = SizingResult::pending(input);
        if let Err(err) = self.try_size(input, &mut result) {
            result.status = SizingStatus::Failed;
            result.warnings.push(format!("Error: {err}"));
        }
        result
    }

    /// Combined derating factor: temperature always, grouping only when given.
    /// A positive factor supplied with the feeder replaces both.
    pub fn derating_factor(&self, input: &SizingInput) -> f64 {
        if let Some(k) = input.derating_override.filter(|k| *k > 0.0 && k.is_finite()) {
            return k;
        }
        let derating = self.catalog.derating();
        let temperature = derating.temperature_factor(input.installation, input.cores);
        let grouping = input
            .grouped_circuits
            .map(|n| derating.grouping_factor(n))
            .unwrap_or(1.0);
        temperature * grouping
    }

    /// Voltage drop of one run carrying `current` through `entry`
    pub fn voltage_drop(
        &self,
        phase: Phase,
        current: Amperes,
        length: Metres,
        entry: &CableCatalogEntry,
        power_factor: f64,
    ) -> Volts {
        let mut impedance = entry.resistance_ohm_per_km * power_factor;
        if self.config.include_reactance {
            let sin_phi = (1.0 - power_factor.powi(2)).max(0.0).sqrt();
            impedance += entry.reactance_ohm_per_km * sin_phi;
        }
        let conductors = match phase {
            Phase::Three => 3f64.sqrt(),
            Phase::Single => 2.0,
        };
        Volts(conductors * current.value() * length.to_kilometres() * impedance)
    }

    fn try_size(&self, input: &SizingInput, result: &mut SizingResult) -> SceapResult<()> {
        let table = self.catalog.table(input.cores)?;
        let largest = self.catalog.largest(input.cores)?;

        if !input.voltage.is_positive() {
            return Err(SceapError::Validation(format!(
                "rated voltage must be positive, got {}",
                input.voltage
            )));
        }
        if input.load.value() < 0.0 || !input.load.value().is_finite() {
            return Err(SceapError::Validation(format!(
                "load must be a non-negative number, got {}",
                input.load
            )));
        }

        let pf = input.power_factor_or_typical();
        let efficiency = input.efficiency_or_typical();
        let flc = full_load_current(input.load, input.voltage, input.phase, pf, efficiency);
        let k = self.derating_factor(input);
        if k <= 0.0 || !k.is_finite() {
            return Err(SceapError::Catalog(format!(
                "derating factor for {} {} is not positive",
                input.cores, input.installation
            )));
        }
        result.full_load_current = flc;
        result.derating_factor = k;

        // Add runs only while even the largest conductor cannot carry its share.
        let mut runs = input.min_runs.max(1);
        let max_runs = self.config.max_parallel_runs.max(runs);
        while largest.rating(input.installation) < flc / f64::from(runs) / k && runs < max_runs {
            runs += 1;
        }
        let per_run = flc / f64::from(runs);
        result.number_of_runs = runs;
        result.derated_current = per_run / k;
        if runs > input.min_runs.max(1) {
            result.warnings.push(format!(
                "{runs} parallel runs required to carry {flc}"
            ));
        }

        result.size_by_ampacity = table
            .iter()
            .find(|e| e.rating(input.installation) >= result.derated_current)
            .unwrap_or(largest)
            .size;

        result.size_by_voltage_drop = self
            .size_by_voltage_drop(table, input, runs, per_run, pf)
            .size;

        let mut short_circuit_floor = None;
        if input.protection.requires_short_circuit_check() {
            if let Some(isc_ka) = input.short_circuit_ka.filter(|ka| *ka > 0.0) {
                let t = input
                    .clearing_time_s
                    .filter(|t| *t > 0.0)
                    .unwrap_or(self.config.default_clearing_time_s);
                let k_sc = short_circuit_constant(input.conductor, input.insulation);
                let min_area = Amperes::from_kiloamperes(isc_ka).value() / (k_sc * t.sqrt());
                result.size_by_short_circuit = Some(
                    table
                        .iter()
                        .find(|e| e.size.value() >= min_area)
                        .unwrap_or(largest)
                        .size,
                );
                short_circuit_floor = Some(min_area);
            }
        }

        result.selected_size = result
            .size_by_ampacity
            .max(result.size_by_voltage_drop)
            .max(result.size_by_short_circuit.unwrap_or_default());
        result.driving_constraint = Some(if result.size_by_short_circuit == Some(result.selected_size) {
            DrivingConstraint::ShortCircuit
        } else if result.size_by_voltage_drop == result.selected_size {
            DrivingConstraint::VoltageDrop
        } else {
            DrivingConstraint::Ampacity
        });

        let entry = self.catalog.entry(input.cores, result.selected_size.value())?;
        result.catalog_rating = entry.rating(input.installation);
        result.installed_rating = result.catalog_rating * k;
        result.resistance_ohm_per_km = entry.resistance_ohm_per_km;
        result.voltage_drop = self.voltage_drop(input.phase, per_run, input.length, entry, pf);
        result.voltage_drop_percent = input.voltage.percent_of(result.voltage_drop);
        result.designation = format!(
            "{}R x {} x {} mm² ({} {})",
            runs,
            input.cores,
            result.selected_size.value(),
            input.conductor.as_str(),
            input.insulation.as_str()
        );

        self.judge(input, result, entry, per_run, short_circuit_floor);
        Ok(())
    }

    fn size_by_voltage_drop<'t>(
        &self,
        table: &'t [CableCatalogEntry],
        input: &SizingInput,
        runs: u32,
        per_run: Amperes,
        pf: f64,
    ) -> &'t CableCatalogEntry {
        let limit = self.config.running_drop_limit_percent;
        table
            .iter()
            .find(|entry| {
                let running = self.voltage_drop(input.phase, per_run, input.length, entry, pf);
                if input.voltage.percent_of(running) > limit {
                    return false;
                }
                match self.starting_drop_percent(input, runs, per_run, entry) {
                    Some((percent, start_limit)) => percent <= start_limit,
                    None => true,
                }
            })
            .unwrap_or(&table[table.len() - 1])
    }

    /// Starting drop in percent and its limit, for motors with a starting
    /// method or a given starting current. A given current replaces the
    /// method's multiple of full-load current; without a method it is
    /// judged against the direct-on-line limit.
    fn starting_drop_percent(
        &self,
        input: &SizingInput,
        runs: u32,
        per_run: Amperes,
        entry: &CableCatalogEntry,
    ) -> Option<(f64, f64)> {
        if !input.load_type.is_motor() {
            return None;
        }
        let given = input.starting_current.filter(|i| i.value() > 0.0);
        let method = match (input.starting_method, given) {
            (Some(method), _) => method,
            (None, Some(_)) => StartingMethod::Dol,
            (None, None) => return None,
        };
        let inrush = match given {
            Some(current) => current / f64::from(runs.max(1)),
            None => per_run * method.current_multiplier(),
        };
        let power_factor = input
            .starting_power_factor
            .filter(|pf| *pf > 0.0 && *pf <= 1.0)
            .unwrap_or(self.config.starting_power_factor);
        let drop = self.voltage_drop(input.phase, inrush, input.length, entry, power_factor);
        Some((input.voltage.percent_of(drop), method.drop_limit_percent()))
    }

    fn judge(
        &self,
        input: &SizingInput,
        result: &mut SizingResult,
        entry: &CableCatalogEntry,
        per_run: Amperes,
        short_circuit_floor: Option<f64>,
    ) {
        if result.total_installed_rating().value() + 1e-9 < result.full_load_current.value() {
            result.warnings.push(format!(
                "Ampacity insufficient: {} x {} installed < {} required",
                result.number_of_runs, result.installed_rating, result.full_load_current
            ));
            result.raise(SizingStatus::Failed);
        }

        if let Some(min_area) = short_circuit_floor {
            if result.selected_size.value() + 1e-9 < min_area {
                result.warnings.push(format!(
                    "Short-circuit withstand needs {:.1} mm², largest {} catalog size is {}",
                    min_area, input.cores, result.selected_size
                ));
                result.raise(SizingStatus::Failed);
            }
        }

        let limit = self.config.running_drop_limit_percent;
        if result.voltage_drop_percent > limit {
            result.warnings.push(format!(
                "Voltage drop high: {:.2}% (limit {}%)",
                result.voltage_drop_percent, limit
            ));
            result.raise(SizingStatus::Warning);
        }

        if let Some((percent, start_limit)) =
            self.starting_drop_percent(input, result.number_of_runs, per_run, entry)
        {
            result.starting_drop_percent = Some(percent);
            if percent > start_limit {
                result.warnings.push(format!(
                    "Starting voltage drop high: {:.2}% (limit {}%)",
                    percent, start_limit
                ));
                result.raise(SizingStatus::Warning);
            }
        }

        if result.selected_size.value() > self.config.practical_size_ceiling {
            result.warnings.push(format!(
                "Large conductor size selected ({}); consider parallel smaller cables or higher voltage",
                result.selected_size
            ));
        }

        if let Some(ambient) = input.ambient_temp_c {
            if ambient > self.config.reference_ambient_c {
                result.warnings.push(format!(
                    "Ambient {ambient} °C exceeds the {} °C derating reference",
                    self.config.reference_ambient_c
                ));
            }
        }

        if input.installation.is_buried() {
            if let Some(ground) = input.ground_temp_c {
                if ground > self.config.reference_ground_c {
                    result.warnings.push(format!(
                        "Ground {ground} °C exceeds the {} °C buried-rating reference",
                        self.config.reference_ground_c
                    ));
                }
            }
        }
    }
}

/// Size every record independently, preserving input order
pub fn size_feeders(records: &[FeederRecord], engine: &SizingEngine<'_>) -> Vec<SizingResult> {
    #[cfg(feature = "parallel")]
    {
        records.par_iter().map(|r| engine.size_record(r)).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        records.iter().map(|r| engine.size_record(r)).collect()
    }
}
