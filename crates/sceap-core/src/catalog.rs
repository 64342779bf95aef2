//! Reference catalog: ampacity, resistance and reactance per conductor size,
//! plus derating factors.
//!
//! The schema is fixed; the contents are configuration. A catalog is keyed by
//! core configuration and holds its entries in ascending conductor size, which
//! is the order every sizing constraint scans in.
//!
//! The bundled catalog ([`CableCatalog::builtin`]) covers 600/1100 V XLPE
//! copper cables rated at 90 °C. Alternative catalogs can be read from JSON in
//! the same shape the bundled data is documented in:
//!
//! ```json
//! { "3C": { "95": { "air": 309, "trench": 310, "duct": 255,
//!                   "resistance_90C": 0.247, "reactance": 0.073 } } }
//! ```

use crate::error::{SceapError, SceapResult};
use crate::units::{Amperes, SquareMillimetres};
use crate::{CoreConfig, InstallationMethod};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One (core configuration, conductor size) row of the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CableCatalogEntry {
    pub size: SquareMillimetres,
    pub air: Amperes,
    pub trench: Amperes,
    pub duct: Amperes,
    /// AC resistance at operating temperature, Ω/km
    pub resistance_ohm_per_km: f64,
    /// Reactance at 50 Hz, Ω/km
    pub reactance_ohm_per_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diameter_mm: Option<f64>,
}

impl CableCatalogEntry {
    /// Catalog ampacity for an installation method, before derating
    pub fn rating(&self, method: InstallationMethod) -> Amperes {
        match method {
            InstallationMethod::Air => self.air,
            InstallationMethod::Trench => self.trench,
            InstallationMethod::Duct => self.duct,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureFactors {
    pub single: f64,
    pub multi: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupingFactor {
    pub circuits: u32,
    pub factor: f64,
}

/// Derating multipliers consumed by the sizing engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeratingTable {
    pub air: TemperatureFactors,
    pub trench: TemperatureFactors,
    pub duct: TemperatureFactors,
    /// Ascending by circuit count
    pub grouping: Vec<GroupingFactor>,
}

impl Default for DeratingTable {
    fn default() -> Self {
        Self {
            air: TemperatureFactors {
                single: 0.76,
                multi: 0.90,
            },
            trench: TemperatureFactors {
                single: 0.76,
                multi: 0.90,
            },
            duct: TemperatureFactors {
                single: 0.67,
                multi: 0.80,
            },
            grouping: [(1, 1.00), (2, 0.95), (3, 0.90), (4, 0.85), (6, 0.80)]
                .into_iter()
                .map(|(circuits, factor)| GroupingFactor { circuits, factor })
                .collect(),
        }
    }
}

impl DeratingTable {
    pub fn temperature_factor(&self, method: InstallationMethod, cores: CoreConfig) -> f64 {
        let factors = match method {
            InstallationMethod::Air => self.air,
            InstallationMethod::Trench => self.trench,
            InstallationMethod::Duct => self.duct,
        };
        if cores.is_single_core() {
            factors.single
        } else {
            factors.multi
        }
    }

    /// Factor of the largest tabulated group not exceeding `circuits`
    pub fn grouping_factor(&self, circuits: u32) -> f64 {
        self.grouping
            .iter()
            .take_while(|g| g.circuits <= circuits)
            .last()
            .map(|g| g.factor)
            .unwrap_or(1.0)
    }
}

/// Immutable conductor catalog keyed by core configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CableCatalog {
    tables: BTreeMap<CoreConfig, Vec<CableCatalogEntry>>,
    derating: DeratingTable,
}

type Row = (f64, f64, f64, f64, f64, f64, f64);

// size, air, trench, duct, R(90 °C) Ω/km, X Ω/km, overall diameter mm
const TWO_CORE: &[Row] = &[
    (2.5, 39.0, 47.0, 40.0, 9.450, 0.1070, 12.0),
    (4.0, 52.0, 63.0, 52.0, 5.880, 0.0930, 13.0),
    (6.0, 67.0, 79.0, 66.0, 3.930, 0.0890, 14.2),
    (10.0, 90.0, 106.0, 87.0, 2.330, 0.0840, 15.6),
    (16.0, 120.0, 137.0, 112.0, 1.470, 0.0810, 17.8),
    (25.0, 156.0, 177.0, 144.0, 0.927, 0.0810, 21.0),
    (35.0, 193.0, 212.0, 173.0, 0.668, 0.0790, 23.2),
    (50.0, 232.0, 252.0, 205.0, 0.494, 0.0750, 26.3),
    (70.0, 292.0, 308.0, 253.0, 0.342, 0.0740, 29.9),
    (95.0, 360.0, 371.0, 304.0, 0.247, 0.0730, 33.9),
    (120.0, 416.0, 420.0, 347.0, 0.197, 0.0720, 37.5),
    (150.0, 353.0, 471.0, 390.0, 0.160, 0.0720, 41.5),
    (185.0, 548.0, 531.0, 442.0, 0.128, 0.0720, 45.7),
    (240.0, 658.0, 615.0, 512.0, 0.0986, 0.0920, 51.5),
    (300.0, 745.0, 688.0, 575.0, 0.0800, 0.0900, 56.1),
    (400.0, 867.0, 776.0, 650.0, 0.0640, 0.0900, 63.3),
];

const THREE_CORE: &[Row] = &[
    (1.5, 24.0, 32.0, 25.0, 15.43, 0.115, 11.7),
    (2.5, 33.0, 41.0, 33.0, 9.450, 0.1070, 12.6),
    (4.0, 45.0, 53.0, 44.0, 5.880, 0.0930, 13.7),
    (6.0, 56.0, 67.0, 54.0, 3.930, 0.0890, 15.0),
    (10.0, 78.0, 89.0, 73.0, 2.330, 0.0840, 16.5),
    (16.0, 101.0, 115.0, 94.0, 1.470, 0.0810, 18.9),
    (25.0, 133.0, 148.0, 121.0, 0.927, 0.0810, 19.9),
    (35.0, 163.0, 177.0, 145.0, 0.668, 0.0790, 22.3),
    (50.0, 199.0, 211.0, 172.0, 0.494, 0.0750, 25.5),
    (70.0, 250.0, 259.0, 211.0, 0.342, 0.0740, 28.2),
    (95.0, 309.0, 310.0, 255.0, 0.247, 0.0730, 32.2),
    (120.0, 357.0, 353.0, 292.0, 0.197, 0.0720, 35.8),
    (150.0, 409.0, 394.0, 329.0, 0.160, 0.0720, 39.0),
    (185.0, 471.0, 445.0, 372.0, 0.128, 0.0720, 43.6),
    (240.0, 556.0, 514.0, 429.0, 0.0986, 0.0920, 49.6),
    (300.0, 633.0, 575.0, 483.0, 0.0800, 0.0900, 54.2),
    (400.0, 728.0, 649.0, 554.0, 0.0640, 0.0900, 61.8),
];

const FOUR_CORE: &[Row] = &[
    (2.5, 33.0, 33.0, 33.0, 9.450, 0.1070, 13.6),
    (4.0, 45.0, 45.0, 44.0, 5.880, 0.0930, 14.8),
    (6.0, 56.0, 56.0, 54.0, 3.930, 0.0890, 16.2),
    (10.0, 78.0, 78.0, 73.0, 2.330, 0.0840, 17.9),
    (16.0, 101.0, 101.0, 94.0, 1.470, 0.0810, 20.6),
    (25.0, 133.0, 148.0, 121.0, 0.927, 0.0810, 22.0),
    (35.0, 163.0, 177.0, 145.0, 0.668, 0.0790, 25.4),
    (50.0, 199.0, 211.0, 172.0, 0.494, 0.0750, 28.3),
    (70.0, 250.0, 259.0, 211.0, 0.342, 0.0740, 32.1),
    (95.0, 309.0, 310.0, 255.0, 0.247, 0.0730, 36.3),
    (120.0, 357.0, 353.0, 292.0, 0.197, 0.0720, 39.7),
    (150.0, 409.0, 394.0, 329.0, 0.160, 0.0720, 44.8),
    (185.0, 471.0, 445.0, 372.0, 0.128, 0.0720, 49.7),
    (240.0, 556.0, 514.0, 429.0, 0.0986, 0.0920, 54.8),
    (300.0, 633.0, 575.0, 483.0, 0.0800, 0.0900, 60.6),
    (400.0, 728.0, 649.0, 554.0, 0.0640, 0.0900, 67.8),
];

const ONE_CORE: &[Row] = &[
    (120.0, 400.0, 375.0, 356.0, 0.1970, 0.0970, 19.6),
    (150.0, 460.0, 419.0, 385.0, 0.1600, 0.0970, 21.6),
    (185.0, 528.0, 471.0, 425.0, 0.1280, 0.0960, 23.6),
    (240.0, 622.0, 542.0, 476.0, 0.0986, 0.0920, 26.5),
    (300.0, 709.0, 606.0, 519.0, 0.0800, 0.0900, 28.9),
    (400.0, 810.0, 671.0, 551.0, 0.0640, 0.0900, 32.4),
    (500.0, 916.0, 744.0, 598.0, 0.0525, 0.0890, 36.0),
    (630.0, 1032.0, 817.0, 645.0, 0.0428, 0.0860, 42.4),
];

fn rows_to_entries(rows: &[Row]) -> Vec<CableCatalogEntry> {
    rows.iter()
        .map(|&(size, air, trench, duct, r, x, dia)| CableCatalogEntry {
            size: SquareMillimetres(size),
            air: Amperes(air),
            trench: Amperes(trench),
            duct: Amperes(duct),
            resistance_ohm_per_km: r,
            reactance_ohm_per_km: x,
            diameter_mm: Some(dia),
        })
        .collect()
}

static BUILTIN: Lazy<CableCatalog> = Lazy::new(|| {
    let tables = [
        (CoreConfig::OneCore, ONE_CORE),
        (CoreConfig::TwoCore, TWO_CORE),
        (CoreConfig::ThreeCore, THREE_CORE),
        (CoreConfig::FourCore, FOUR_CORE),
    ]
    .into_iter()
    .map(|(cores, rows)| (cores, rows_to_entries(rows)))
    .collect();
    CableCatalog {
        tables,
        derating: DeratingTable::default(),
    }
});

#[derive(Deserialize)]
struct RawEntry {
    air: f64,
    trench: f64,
    duct: f64,
    #[serde(alias = "resistance_90C")]
    resistance: f64,
    #[serde(default)]
    reactance: f64,
    #[serde(default, alias = "cableDia")]
    diameter_mm: Option<f64>,
}

#[derive(Deserialize)]
struct RawCatalog {
    #[serde(default)]
    derating: Option<DeratingTable>,
    #[serde(flatten)]
    tables: HashMap<String, HashMap<String, RawEntry>>,
}

impl CableCatalog {
    /// Bundled 600/1100 V XLPE copper catalog
    pub fn builtin() -> &'static CableCatalog {
        &BUILTIN
    }

    /// Build a catalog from unordered tables; entries are sorted by size.
    ///
    /// Fails on empty tables, duplicate sizes and non-positive ratings or
    /// resistances.
    pub fn new(
        tables: BTreeMap<CoreConfig, Vec<CableCatalogEntry>>,
        derating: DeratingTable,
    ) -> SceapResult<Self> {
        let mut sorted = BTreeMap::new();
        for (cores, mut entries) in tables {
            if entries.is_empty() {
                return Err(SceapError::Catalog(format!("table {cores} has no entries")));
            }
            entries.sort_by(|a, b| a.size.0.total_cmp(&b.size.0));
            for pair in entries.windows(2) {
                if pair[0].size == pair[1].size {
                    return Err(SceapError::Catalog(format!(
                        "table {cores} lists {} twice",
                        pair[0].size
                    )));
                }
            }
            if let Some(bad) = entries.iter().find(|e| {
                !e.size.is_positive()
                    || !e.resistance_ohm_per_km.is_finite()
                    || e.resistance_ohm_per_km <= 0.0
                    || [e.air, e.trench, e.duct].iter().any(|a| !a.is_positive())
            }) {
                return Err(SceapError::Catalog(format!(
                    "table {cores} entry {} has non-positive data",
                    bad.size
                )));
            }
            sorted.insert(cores, entries);
        }
        if sorted.is_empty() {
            return Err(SceapError::Catalog("catalog has no tables".into()));
        }
        Ok(Self {
            tables: sorted,
            derating,
        })
    }

    /// Parse a catalog keyed by core label then numeric size string.
    ///
    /// An optional top-level `"derating"` object replaces the default derating
    /// table.
    pub fn from_json_str(json: &str) -> SceapResult<Self> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        let mut tables = BTreeMap::new();
        for (label, rows) in raw.tables {
            let cores: CoreConfig = label
                .parse()
                .map_err(|e| SceapError::Catalog(format!("{e}")))?;
            let mut entries = Vec::with_capacity(rows.len());
            for (size_key, row) in rows {
                let size: f64 = size_key.trim().parse().map_err(|_| {
                    SceapError::Catalog(format!("table {label}: size '{size_key}' is not numeric"))
                })?;
                entries.push(CableCatalogEntry {
                    size: SquareMillimetres(size),
                    air: Amperes(row.air),
                    trench: Amperes(row.trench),
                    duct: Amperes(row.duct),
                    resistance_ohm_per_km: row.resistance,
                    reactance_ohm_per_km: row.reactance,
                    diameter_mm: row.diameter_mm,
                });
            }
            if tables.insert(cores, entries).is_some() {
                return Err(SceapError::Catalog(format!(
                    "core configuration {cores} defined twice"
                )));
            }
        }
        Self::new(tables, raw.derating.unwrap_or_default())
    }

    pub fn derating(&self) -> &DeratingTable {
        &self.derating
    }

    pub fn core_configs(&self) -> impl Iterator<Item = CoreConfig> + '_ {
        self.tables.keys().copied()
    }

    /// Entries for a core configuration, ascending by size
    pub fn table(&self, cores: CoreConfig) -> SceapResult<&[CableCatalogEntry]> {
        self.tables
            .get(&cores)
            .map(Vec::as_slice)
            .ok_or_else(|| SceapError::Lookup(format!("no catalog data for core config {cores}")))
    }

    pub fn entry(&self, cores: CoreConfig, size: f64) -> SceapResult<&CableCatalogEntry> {
        self.table(cores)?
            .iter()
            .find(|e| (e.size.0 - size).abs() < 1e-9)
            .ok_or_else(|| {
                SceapError::Lookup(format!("selected size {size} mm² not in {cores} catalog"))
            })
    }

    pub fn largest(&self, cores: CoreConfig) -> SceapResult<&CableCatalogEntry> {
        self.table(cores)?
            .last()
            .ok_or_else(|| SceapError::Lookup(format!("{cores} catalog is empty")))
    }
}
