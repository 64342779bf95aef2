//! File-facing side of sceap: feeder schedule import, configuration and
//! catalog loading, and result export.
//!
//! Everything that touches the filesystem lives here so that `sceap-core`
//! stays a pure in-memory library.

pub mod config;
pub mod export;
pub mod import;
pub mod normalize;

pub use config::{load_catalog, load_engine_config};
pub use export::{
    write_paths_json, write_sizing_csv, write_sizing_csv_file, PathReport, PathSummary, SizingRow,
};
pub use import::{read_feeders, read_feeders_csv, FeederImport};
pub use normalize::{detect_columns, parse_number, ColumnMap, Field, Normalizer, NormalizerDefaults};

use thiserror::Error;

/// Problems that make a feeder table unusable as a whole
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("missing required column(s): {0}")]
    MissingColumns(String),

    #[error("feeder table has no header row")]
    NoHeader,

    #[error("unsupported file extension '{0}'")]
    UnsupportedFormat(String),
}
