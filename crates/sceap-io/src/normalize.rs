//! Record normalizer: arbitrary feeder-schedule headers to [`FeederRecord`]s.
//!
//! Headers are matched against a synonym table per canonical field. An exact
//! match (case and spacing ignored) wins, then a match with punctuation and
//! spaces squeezed out, which also covers camelCase keys such as `fromBus`.
//! Otherwise the longest synonym that is a substring of a still unclaimed
//! header is taken, so "Cable Length Riser" is claimed by the riser field
//! before the plain length field sees it.
//!
//! Cell values are read leniently: the first numeric token of a cell is used
//! (`"11 kV"` → 11), voltages written in kV are converted to volts, and power
//! factors or efficiencies written as percentages are scaled to fractions.
//! Every default applied to a present but unreadable cell is counted in the
//! returned [`ImportDiagnostics`].

use crate::ImportError;
use sceap_core::diagnostics::ImportDiagnostics;
use sceap_core::units::{Amperes, Kilowatts, Metres, Volts};
use sceap_core::{
    normalize_bus, ConductorMaterial, CoreConfig, FeederRecord, InstallationMethod, Insulation,
    LoadType, Phase, ProtectionType, StartingMethod,
};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Canonical feeder field a column can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Field {
    SerialNo,
    CableNumber,
    Description,
    FromBus,
    ToBus,
    Voltage,
    Phase,
    LoadKw,
    LoadKva,
    PowerUnit,
    PowerFactor,
    Efficiency,
    LoadType,
    Length,
    LengthBuilding,
    LengthToEquipment,
    LengthRiser,
    LengthDropping,
    LengthSpare,
    Cores,
    Conductor,
    Insulation,
    Installation,
    Protection,
    ShortCircuit,
    ClearingTime,
    AmbientTemp,
    GroupedCircuits,
    StartingMethod,
    DeratingFactor,
    GroundTemp,
    StartingCurrent,
    StartingPowerFactor,
}

impl Field {
    pub const ALL: [Field; 33] = [
        Field::SerialNo,
        Field::CableNumber,
        Field::Description,
        Field::FromBus,
        Field::ToBus,
        Field::Voltage,
        Field::Phase,
        Field::LoadKw,
        Field::LoadKva,
        Field::PowerUnit,
        Field::PowerFactor,
        Field::Efficiency,
        Field::LoadType,
        Field::Length,
        Field::LengthBuilding,
        Field::LengthToEquipment,
        Field::LengthRiser,
        Field::LengthDropping,
        Field::LengthSpare,
        Field::Cores,
        Field::Conductor,
        Field::Insulation,
        Field::Installation,
        Field::Protection,
        Field::ShortCircuit,
        Field::ClearingTime,
        Field::AmbientTemp,
        Field::GroupedCircuits,
        Field::StartingMethod,
        Field::DeratingFactor,
        Field::GroundTemp,
        Field::StartingCurrent,
        Field::StartingPowerFactor,
    ];

    /// Lower-case header spellings, most specific first
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            Field::SerialNo => &["serial no", "s.no", "sl no", "sno", "sr no", "serial"],
            Field::CableNumber => &[
                "cable number",
                "cable no",
                "cable tag",
                "tag no",
                "feeder id",
                "cable",
            ],
            Field::Description => &["feeder description", "description", "desc", "name"],
            Field::FromBus => &["from bus", "from", "source", "equipment", "origin", "start"],
            Field::ToBus => &["to bus", "to", "destination", "panel", "target", "end"],
            Field::Voltage => &[
                "voltage (v)",
                "rated voltage",
                "nominal voltage",
                "supply voltage",
                "voltage",
                "v (v)",
                "kv",
                "v",
            ],
            Field::Phase => &["3phase / 1phase", "phase"],
            Field::LoadKw => &[
                "load (kw)",
                "power (kw)",
                "rated power (kw)",
                "load kw",
                "rated power",
                "load",
                "power",
                "kw",
            ],
            Field::LoadKva => &["rated power (kva)", "load (kva)", "power kva", "kva"],
            Field::PowerUnit => &["unit (kw / kva)", "unit (kw/kva)", "power unit", "unit"],
            Field::PowerFactor => &["power factor (pf)", "power factor", "cos phi", "cos φ", "pf"],
            Field::Efficiency => &["efficiency (%)", "efficiency %", "efficiency", "eff (%)", "eff"],
            Field::LoadType => &["load type", "type of feeder", "feeder type", "type"],
            Field::Length => &[
                "cable length for each run",
                "length (m)",
                "cable length",
                "route length",
                "length",
                "distance",
                "l (m)",
                "l",
            ],
            Field::LengthBuilding => &[
                "cable length with in electrical building",
                "cable length building",
            ],
            Field::LengthToEquipment => &[
                "cable length from electrical building to equipment",
                "cable length to equipment",
            ],
            Field::LengthRiser => &["cable length riser & dropper", "cable length riser"],
            Field::LengthDropping => &[
                "cable length both side dropping & termination",
                "cable length dropping",
            ],
            Field::LengthSpare => &["spare 10%", "spare length", "cable length spare", "spare"],
            Field::Cores => &[
                "no. of cores",
                "number of cores",
                "core count",
                "cores",
                "core",
                "cable type",
            ],
            Field::Conductor => &["conductor material", "conductor", "material"],
            Field::Insulation => &["insulation"],
            Field::Installation => &[
                "installation method",
                "cable installation",
                "installation",
                "laying",
                "method",
            ],
            Field::Protection => &["protection type", "breaker type", "protection", "breaker"],
            Field::ShortCircuit => &[
                "short circuit current of switchboard",
                "max short circuit current",
                "short circuit current (ka)",
                "short circuit current",
                "short circuit",
                "sc current",
                "isc",
            ],
            Field::ClearingTime => &[
                "short circuit current withstand duration",
                "sc withstand duration",
                "clearing time",
                "sc duration",
                "duration (sec)",
            ],
            Field::AmbientTemp => &[
                "ambient temp (°c)",
                "ambient temperature",
                "ambient temp",
                "ambient",
            ],
            Field::GroupedCircuits => &[
                "grouped loaded circuits",
                "number of loaded circuits",
                "grouped circuits",
                "loaded circuits",
                "circuits",
            ],
            Field::StartingMethod => &["starting method", "starting"],
            Field::DeratingFactor => &["derating factor", "derating k", "derating", "k"],
            Field::GroundTemp => &[
                "ground temp (°c)",
                "ground temperature",
                "ground temp",
                "soil temp",
            ],
            Field::StartingCurrent => &[
                "motor starting current",
                "starting current",
                "startup current",
                "locked rotor current",
            ],
            Field::StartingPowerFactor => &[
                "motor starting power factor",
                "starting power factor",
                "motor starting pf",
                "starting pf",
            ],
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Lower-case, trimmed, inner whitespace collapsed
fn normalize_header(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Letters and digits only, so `loadKW`, `Load (kW)` and `load kw` agree
fn squeeze_header(header: &str) -> String {
    header.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Resolved column index per canonical field
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnMap {
    columns: HashMap<Field, usize>,
    headers: Vec<String>,
}

impl ColumnMap {
    pub fn get(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn header(&self, field: Field) -> Option<&str> {
        self.get(field).map(|i| self.headers[i].as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Mapped fields in declaration order with their source header
    pub fn mappings(&self) -> Vec<(Field, &str)> {
        let mut pairs: Vec<(Field, &str)> = self
            .columns
            .iter()
            .map(|(&f, &i)| (f, self.headers[i].as_str()))
            .collect();
        pairs.sort_by_key(|(f, _)| *f);
        pairs
    }

    /// Fail unless both bus columns were found
    pub fn require_bus_columns(&self) -> Result<(), ImportError> {
        let missing: Vec<&'static str> = [(Field::FromBus, "from bus"), (Field::ToBus, "to bus")]
            .into_iter()
            .filter(|(f, _)| self.get(*f).is_none())
            .map(|(_, name)| name)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MissingColumns(missing.join(", ")))
        }
    }
}

/// Map headers to canonical fields
pub fn detect_columns(headers: &[String]) -> ColumnMap {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    let mut columns: HashMap<Field, usize> = HashMap::new();
    let mut claimed = vec![false; headers.len()];

    for field in Field::ALL {
        'synonyms: for synonym in field.synonyms() {
            for (i, header) in normalized.iter().enumerate() {
                if !claimed[i] && header == synonym {
                    columns.insert(field, i);
                    claimed[i] = true;
                    break 'synonyms;
                }
            }
        }
    }

    let squeezed: Vec<String> = normalized.iter().map(|h| squeeze_header(h)).collect();
    for field in Field::ALL {
        if columns.contains_key(&field) {
            continue;
        }
        'squeezed: for synonym in field.synonyms() {
            let key = squeeze_header(synonym);
            if key.is_empty() {
                continue;
            }
            for (i, header) in squeezed.iter().enumerate() {
                if !claimed[i] && *header == key {
                    columns.insert(field, i);
                    claimed[i] = true;
                    break 'squeezed;
                }
            }
        }
    }

    // Substring pass: longest synonyms first, short tokens like "to" or "v"
    // only ever match exactly.
    let mut candidates: Vec<(Field, &'static str)> = Field::ALL
        .iter()
        .flat_map(|&f| f.synonyms().iter().map(move |&s| (f, s)))
        .filter(|(_, s)| s.chars().count() >= 3)
        .collect();
    candidates.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    for (field, synonym) in candidates {
        if columns.contains_key(&field) {
            continue;
        }
        if let Some(i) = (0..normalized.len()).find(|&i| !claimed[i] && normalized[i].contains(synonym)) {
            columns.insert(field, i);
            claimed[i] = true;
        }
    }

    ColumnMap {
        columns,
        headers: headers.to_vec(),
    }
}

/// First numeric token of a cell, with thousands separators removed
pub fn parse_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell.chars().filter(|c| *c != ',').collect();
    let bytes = cleaned.as_bytes();
    let start = bytes
        .iter()
        .enumerate()
        .position(|(i, b)| {
            b.is_ascii_digit()
                || ((*b == b'-' || *b == b'.')
                    && bytes.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
        })?;
    let mut end = start + 1;
    let mut seen_dot = bytes[start] == b'.';
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            b'e' | b'E'
                if bytes
                    .get(end + 1)
                    .is_some_and(|n| n.is_ascii_digit() || *n == b'-') =>
            {
                end += 2;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                break;
            }
            _ => break,
        }
    }
    cleaned[start..end].parse().ok()
}

/// Values used when a cell is missing or unreadable
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizerDefaults {
    pub voltage: Volts,
    pub power_factor: f64,
    pub efficiency: f64,
    pub cores: CoreConfig,
    pub installation: InstallationMethod,
    pub protection: ProtectionType,
    pub conductor: ConductorMaterial,
    pub insulation: Insulation,
    pub load_type: LoadType,
}

impl Default for NormalizerDefaults {
    fn default() -> Self {
        Self {
            voltage: Volts(415.0),
            power_factor: 0.85,
            efficiency: 0.95,
            cores: CoreConfig::ThreeCore,
            installation: InstallationMethod::Air,
            protection: ProtectionType::Mccb,
            conductor: ConductorMaterial::Copper,
            insulation: Insulation::Xlpe,
            load_type: LoadType::Motor,
        }
    }
}

/// Turns table rows into feeder records using one resolved column map
#[derive(Debug, Clone)]
pub struct Normalizer {
    columns: ColumnMap,
    defaults: NormalizerDefaults,
}

struct RowReader<'a> {
    row: &'a [String],
    columns: &'a ColumnMap,
    row_number: usize,
    cable: String,
}

impl<'a> RowReader<'a> {
    fn text(&self, field: Field) -> Option<&'a str> {
        let idx = self.columns.get(field)?;
        let cell = self.row.get(idx)?.trim();
        (!cell.is_empty()).then_some(cell)
    }

    fn number(&self, field: Field, diag: &mut ImportDiagnostics) -> Option<f64> {
        let cell = self.text(field)?;
        match parse_number(cell) {
            Some(v) if v.is_finite() => Some(v),
            _ => {
                diag.add_default(
                    &format!("{}: {} '{}' is not a number", self.cable, field, cell),
                    self.row_number,
                );
                None
            }
        }
    }

    fn label<T: FromStr>(&self, field: Field, default: T, diag: &mut ImportDiagnostics) -> T {
        let Some(cell) = self.text(field) else {
            return default;
        };
        match cell.parse() {
            Ok(value) => value,
            Err(_) => {
                diag.add_default(
                    &format!("{}: unrecognised {} '{}', using default", self.cable, field, cell),
                    self.row_number,
                );
                default
            }
        }
    }
}

/// Fractions written as percentages (`85` for 0.85) are scaled down
fn fraction(value: f64) -> f64 {
    if value > 1.0 {
        value / 100.0
    } else {
        value
    }
}

impl Normalizer {
    pub fn new(columns: ColumnMap) -> Self {
        Self::with_defaults(columns, NormalizerDefaults::default())
    }

    pub fn with_defaults(columns: ColumnMap, defaults: NormalizerDefaults) -> Self {
        Self { columns, defaults }
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// Normalize every row; rows without a from bus are skipped
    pub fn normalize_rows(&self, rows: &[Vec<String>]) -> (Vec<FeederRecord>, ImportDiagnostics) {
        let mut diag = ImportDiagnostics::new();
        let mut records = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            diag.stats.rows += 1;
            if let Some(record) = self.normalize_row(row, i + 1, &mut diag) {
                records.push(record);
            }
        }
        diag.stats.feeders = records.len();
        (records, diag)
    }

    /// One row to one record. `row_number` is 1-based over data rows.
    pub fn normalize_row(
        &self,
        row: &[String],
        row_number: usize,
        diag: &mut ImportDiagnostics,
    ) -> Option<FeederRecord> {
        let mut reader = RowReader {
            row,
            columns: &self.columns,
            row_number,
            cable: String::new(),
        };
        let d = &self.defaults;

        let Some(from_bus) = reader.text(Field::FromBus) else {
            if row.iter().any(|c| !c.trim().is_empty()) {
                diag.add_skipped("row has no from bus", row_number);
            } else {
                diag.stats.skipped_rows += 1;
            }
            return None;
        };
        let to_bus = reader.text(Field::ToBus).unwrap_or_default();

        let cable_number = match reader.text(Field::CableNumber) {
            Some(c) => c.to_string(),
            None => {
                let generated = format!("ROW-{row_number:03}");
                debug!(row = row_number, cable = %generated, "cable number missing");
                generated
            }
        };
        reader.cable = cable_number.clone();

        let mut record = FeederRecord::new(&cable_number, from_bus, to_bus);
        record.serial_no = reader
            .number(Field::SerialNo, diag)
            .map(|n| n.max(0.0) as u32)
            .unwrap_or(row_number as u32);
        record.description = reader.text(Field::Description).unwrap_or_default().to_string();

        record.voltage = self.read_voltage(&reader, diag);
        record.phase = match reader.text(Field::Phase).map(str::parse::<Phase>) {
            Some(Ok(phase)) => phase,
            other => {
                if let Some(Err(_)) = other {
                    diag.add_default(
                        &format!("{cable_number}: unrecognised phase, inferred from voltage"),
                        row_number,
                    );
                }
                if record.voltage.value() >= 400.0 {
                    Phase::Three
                } else {
                    Phase::Single
                }
            }
        };

        let pf = reader
            .number(Field::PowerFactor, diag)
            .map(fraction)
            .filter(|v| *v > 0.0 && *v <= 1.0)
            .unwrap_or(d.power_factor);
        let efficiency = reader
            .number(Field::Efficiency, diag)
            .map(fraction)
            .filter(|v| *v > 0.0 && *v <= 1.0)
            .unwrap_or(d.efficiency);
        record.power_factor = Some(pf);
        record.efficiency = Some(efficiency);
        record.load = self.read_load(&reader, pf, efficiency, diag);
        record.load_type = reader.label(Field::LoadType, d.load_type, diag);

        record.length = self.read_length(&reader, diag);
        record.core_config = reader.label(Field::Cores, d.cores, diag);
        record.conductor = reader.label(Field::Conductor, d.conductor, diag);
        record.insulation = reader.label(Field::Insulation, d.insulation, diag);
        record.installation = reader.label(Field::Installation, d.installation, diag);
        record.protection = reader.label(Field::Protection, d.protection, diag);

        record.short_circuit_ka = reader
            .number(Field::ShortCircuit, diag)
            .filter(|v| *v > 0.0);
        record.clearing_time_s = reader
            .number(Field::ClearingTime, diag)
            .filter(|v| *v > 0.0);
        record.ambient_temp_c = reader.number(Field::AmbientTemp, diag);
        record.grouped_circuits = reader
            .number(Field::GroupedCircuits, diag)
            .filter(|v| *v >= 1.0)
            .map(|v| v.round() as u32);
        record.starting_method = reader
            .text(Field::StartingMethod)
            .and_then(|cell| match cell.parse::<StartingMethod>() {
                Ok(method) => Some(method),
                Err(_) => {
                    diag.add_default(
                        &format!("{cable_number}: unrecognised starting method '{cell}'"),
                        row_number,
                    );
                    None
                }
            });

        record.derating_override = reader
            .number(Field::DeratingFactor, diag)
            .filter(|v| *v > 0.0);
        record.ground_temp_c = reader.number(Field::GroundTemp, diag);
        record.starting_current = reader
            .number(Field::StartingCurrent, diag)
            .filter(|v| *v > 0.0)
            .map(Amperes);
        record.starting_power_factor = reader
            .number(Field::StartingPowerFactor, diag)
            .map(fraction)
            .filter(|v| *v > 0.0 && *v <= 1.0);

        if normalize_bus(&record.to_bus).is_empty() {
            debug!(row = row_number, cable = %cable_number, "row has no to bus");
        }
        Some(record)
    }

    fn read_voltage(&self, reader: &RowReader<'_>, diag: &mut ImportDiagnostics) -> Volts {
        let Some(cell) = reader.text(Field::Voltage) else {
            debug!(row = reader.row_number, "voltage missing, using default");
            return self.defaults.voltage;
        };
        let explicit_kv = cell.to_ascii_lowercase().contains("kv")
            || reader
                .columns
                .header(Field::Voltage)
                .is_some_and(|h| h.to_ascii_lowercase().contains("kv"));
        match reader.number(Field::Voltage, diag) {
            Some(v) if v > 0.0 && (explicit_kv || v < 100.0) => Volts::from_kilovolts(v),
            Some(v) if v > 0.0 => Volts(v),
            _ => self.defaults.voltage,
        }
    }

    fn read_load(
        &self,
        reader: &RowReader<'_>,
        pf: f64,
        efficiency: f64,
        diag: &mut ImportDiagnostics,
    ) -> Kilowatts {
        let unit_is_kva = reader
            .text(Field::PowerUnit)
            .is_some_and(|u| u.to_ascii_lowercase().contains("kva"));
        if let Some(value) = reader.number(Field::LoadKw, diag).filter(|v| *v > 0.0) {
            return if unit_is_kva {
                Kilowatts::from_kva(value, pf, efficiency)
            } else {
                Kilowatts(value)
            };
        }
        if let Some(kva) = reader.number(Field::LoadKva, diag).filter(|v| *v > 0.0) {
            return Kilowatts::from_kva(kva, pf, efficiency);
        }
        Kilowatts(0.0)
    }

    /// Route length, or the sum of its components when no total is given
    fn read_length(&self, reader: &RowReader<'_>, diag: &mut ImportDiagnostics) -> Metres {
        if let Some(length) = reader.number(Field::Length, diag).filter(|v| *v > 0.0) {
            return Metres(length);
        }
        [
            Field::LengthBuilding,
            Field::LengthToEquipment,
            Field::LengthRiser,
            Field::LengthDropping,
            Field::LengthSpare,
        ]
        .into_iter()
        .filter_map(|f| reader.number(f, diag))
        .filter(|v| *v > 0.0)
        .map(Metres)
        .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_then_substring_matching() {
        let map = detect_columns(&headers(&[
            "S.No",
            "Cable Number",
            "From Bus",
            "To Bus",
            "Voltage (V)",
            "Load (kW)",
            "Cable Length Riser (m)",
            "Cable length for each run (m)",
            "No. of Cores",
        ]));
        assert_eq!(map.get(Field::SerialNo), Some(0));
        assert_eq!(map.get(Field::FromBus), Some(2));
        assert_eq!(map.get(Field::ToBus), Some(3));
        assert_eq!(map.get(Field::LoadKw), Some(5));
        assert_eq!(map.get(Field::LengthRiser), Some(6));
        assert_eq!(map.get(Field::Length), Some(7));
        assert_eq!(map.get(Field::Cores), Some(8));
        assert!(map.require_bus_columns().is_ok());
    }

    #[test]
    fn test_camel_case_keys_match_squeezed_synonyms() {
        let map = detect_columns(&headers(&[
            "serialNo",
            "cableNumber",
            "fromBus",
            "toBus",
            "loadKW",
            "numberOfCores",
            "installationMethod",
            "groundTemp",
            "scDuration",
        ]));
        assert_eq!(map.get(Field::SerialNo), Some(0));
        assert_eq!(map.get(Field::CableNumber), Some(1));
        assert_eq!(map.get(Field::FromBus), Some(2));
        assert_eq!(map.get(Field::ToBus), Some(3));
        assert_eq!(map.get(Field::LoadKw), Some(4));
        assert_eq!(map.get(Field::Cores), Some(5));
        assert_eq!(map.get(Field::Installation), Some(6));
        assert_eq!(map.get(Field::GroundTemp), Some(7));
        assert_eq!(map.get(Field::ClearingTime), Some(8));
        assert!(map.require_bus_columns().is_ok());
    }

    #[test]
    fn test_starting_columns_win_over_shorter_synonyms() {
        let map = detect_columns(&headers(&[
            "From Bus",
            "To Bus",
            "Power Factor",
            "Motor starting power factor",
            "Starting Current (A)",
            "Starting Method",
            "Derating Factor",
        ]));
        assert_eq!(map.get(Field::PowerFactor), Some(2));
        assert_eq!(map.get(Field::StartingPowerFactor), Some(3));
        assert_eq!(map.get(Field::StartingCurrent), Some(4));
        assert_eq!(map.get(Field::StartingMethod), Some(5));
        assert_eq!(map.get(Field::DeratingFactor), Some(6));

        let normalizer = Normalizer::new(map);
        let (records, diag) = normalizer.normalize_rows(&[row(&[
            "M1", "MCC", "0.86", "25", "540", "DOL", "0",
        ])]);
        let r = &records[0];
        assert_eq!(r.starting_power_factor, Some(0.25));
        assert_eq!(r.starting_current, Some(Amperes(540.0)));
        assert_eq!(r.derating_override, None);
        assert_eq!(diag.stats.defaulted_values, 0);
    }

    #[test]
    fn test_short_synonyms_never_match_inside_words() {
        let map = detect_columns(&headers(&["Motor", "Source", "Destination"]));
        assert_eq!(map.get(Field::FromBus), Some(1));
        assert_eq!(map.get(Field::ToBus), Some(2));
        assert_eq!(map.get(Field::Voltage), None);
    }

    #[test]
    fn test_missing_bus_columns_are_reported() {
        let map = detect_columns(&headers(&["Cable", "Load"]));
        let err = map.require_bus_columns().unwrap_err();
        assert_eq!(err.to_string(), "missing required column(s): from bus, to bus");
    }

    #[test]
    fn test_parse_number_takes_first_token() {
        assert_eq!(parse_number("11 kV"), Some(11.0));
        assert_eq!(parse_number("approx. 1,200 m"), Some(1200.0));
        assert_eq!(parse_number("-3.5"), Some(-3.5));
        assert_eq!(parse_number(".85"), Some(0.85));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("n/a"), None);
    }

    #[test]
    fn test_row_normalization_converts_units() {
        let map = detect_columns(&headers(&[
            "Cable No",
            "From Bus",
            "To Bus",
            "Voltage",
            "Rated Power (kVA)",
            "Power Factor",
            "Efficiency (%)",
            "Length (m)",
            "Cores",
            "Installation Method",
            "Breaker Type",
            "Short circuit current (kA)",
        ]));
        let normalizer = Normalizer::new(map);
        let (records, diag) = normalizer.normalize_rows(&[row(&[
            "C-7", " mcc-1", "PMCC", "11 kV", "100", "85", "90", "120 m", "4", "Trench",
            "ACB", "50",
        ])]);

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.cable_number, "C-7");
        assert_eq!(r.from_bus, "mcc-1");
        assert_eq!(r.voltage, Volts(11_000.0));
        assert_eq!(r.phase, Phase::Three);
        assert_eq!(r.power_factor, Some(0.85));
        assert_eq!(r.efficiency, Some(0.9));
        assert!((r.load.value() - 76.5).abs() < 1e-9);
        assert_eq!(r.length, Metres(120.0));
        assert_eq!(r.core_config, CoreConfig::FourCore);
        assert_eq!(r.installation, InstallationMethod::Trench);
        assert_eq!(r.protection, ProtectionType::Acb);
        assert_eq!(r.short_circuit_ka, Some(50.0));
        assert_eq!(diag.stats.defaulted_values, 0);
    }

    #[test]
    fn test_defaults_and_skips_are_counted() {
        let map = detect_columns(&headers(&["Cable", "From", "To", "Voltage", "Load", "Cores"]));
        let normalizer = Normalizer::new(map);
        let (records, diag) = normalizer.normalize_rows(&[
            row(&["C-1", "M1", "MCC", "tbd", "7.5", "XC"]),
            row(&["C-2", "", "MCC", "415", "5", "3C"]),
            row(&["", "", "", "", "", ""]),
            row(&["", "M3", "MCC", "230", "2", "2"]),
        ]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].voltage, Volts(415.0));
        assert_eq!(records[0].core_config, CoreConfig::ThreeCore);
        assert_eq!(records[1].cable_number, "ROW-004");
        assert_eq!(records[1].phase, Phase::Single);
        assert_eq!(records[1].core_config, CoreConfig::TwoCore);
        assert_eq!(diag.stats.rows, 4);
        assert_eq!(diag.stats.feeders, 2);
        assert_eq!(diag.stats.skipped_rows, 2);
        assert_eq!(diag.stats.defaulted_values, 2);
        assert_eq!(diag.diagnostics.error_count(), 1);
    }

    #[test]
    fn test_length_summed_from_components() {
        let map = detect_columns(&headers(&[
            "From Bus",
            "To Bus",
            "Cable Length Building (m)",
            "Cable Length to Equipment (m)",
            "Cable length Riser & Dropper",
            "Spare 10%",
        ]));
        let normalizer = Normalizer::new(map);
        let (records, _) = normalizer.normalize_rows(&[row(&["M1", "MCC", "20", "65", "8", "9.3"])]);
        assert!((records[0].length.value() - 102.3).abs() < 1e-9);
    }

    #[test]
    fn test_kw_column_with_kva_unit() {
        let map = detect_columns(&headers(&["From", "To", "Load", "Unit (kW/kVA)", "PF", "Eff"]));
        let normalizer = Normalizer::new(map);
        let (records, _) =
            normalizer.normalize_rows(&[row(&["M1", "MCC", "50", "kVA", "0.8", "1.0"])]);
        assert!((records[0].load.value() - 40.0).abs() < 1e-9);
    }
}
