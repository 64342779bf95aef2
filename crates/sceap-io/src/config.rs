//! Loading engine settings and cable catalogs from disk.
//!
//! Engine configuration is TOML (or JSON when the file ends in `.json`);
//! every table and key is optional and falls back to the built-in defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sceap_core::{CableCatalog, EngineConfig};
use tracing::debug;

/// Read an [`EngineConfig`] from a TOML or JSON file
pub fn load_engine_config(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let config: EngineConfig = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
    } else {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?
    };
    debug!(path = %path.display(), "engine config loaded");
    Ok(config)
}

/// Read a replacement cable catalog from a JSON file
pub fn load_catalog(path: impl AsRef<Path>) -> Result<CableCatalog> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
    let catalog = CableCatalog::from_json_str(&content)
        .with_context(|| format!("Invalid cable catalog: {}", path.display()))?;
    debug!(
        path = %path.display(),
        tables = catalog.core_configs().count(),
        "cable catalog loaded"
    );
    Ok(catalog)
}
