pub mod graph;
pub mod hierarchy;
pub mod paths;
pub mod size;
pub mod validate;

use std::path::Path;

use anyhow::Result;
use sceap_core::{CableCatalog, EngineConfig, Severity, SizingEngine};
use sceap_io::FeederImport;
use tracing::{info, warn};

use sceap_cli::Cli;

/// Configuration and catalog shared by every subcommand
pub struct Session {
    pub config: EngineConfig,
    catalog: Option<CableCatalog>,
}

impl Session {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => {
                info!("Loading engine config from {}", path.display());
                sceap_io::load_engine_config(path)?
            }
            None => EngineConfig::default(),
        };
        let catalog = match &cli.catalog {
            Some(path) => {
                info!("Loading cable catalog from {}", path.display());
                Some(sceap_io::load_catalog(path)?)
            }
            None => None,
        };
        Ok(Self { config, catalog })
    }

    pub fn catalog(&self) -> &CableCatalog {
        self.catalog.as_ref().unwrap_or_else(|| CableCatalog::builtin())
    }

    pub fn engine(&self) -> SizingEngine<'_> {
        SizingEngine::new(self.catalog(), &self.config.sizing)
    }

    /// Import a schedule and surface its diagnostics through the log
    pub fn load_feeders(&self, path: &Path) -> Result<FeederImport> {
        info!("Reading feeder schedule {}", path.display());
        let import = sceap_io::read_feeders_csv(path)?;
        for issue in import.diagnostics.diagnostics.iter() {
            match issue.severity {
                Severity::Error => warn!("{issue}"),
                Severity::Warning => info!("{issue}"),
            }
        }
        info!("{}", import.diagnostics.summary());
        Ok(import)
    }
}
