//! `graphport.toml` loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use graphport_core::SchemaDescription;
use graphport_graph::GraphConfig;
use serde::Deserialize;
use tracing::debug;

/// Read from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "graphport.toml";

/// File-level defaults for a run. Command-line flags take precedence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// SQLite knowledge base.
    pub source: Option<PathBuf>,
    /// Dump directory, recreated on every run.
    pub destination: Option<PathBuf>,
    /// Display names of the roots to import; empty imports all.
    pub roots: Vec<String>,
    /// Schema description replacing the built-in one.
    pub schema: Option<PathBuf>,
    pub neo4j: GraphConfig,
}

impl ImportConfig {
    /// Load `explicit`, or [`DEFAULT_CONFIG_FILE`] if it exists, or defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// The schema description at `path`, or the built-in one.
pub fn load_schema(path: Option<&Path>) -> Result<SchemaDescription> {
    match path {
        Some(path) => SchemaDescription::load(path)
            .with_context(|| format!("Failed to load schema description {}", path.display())),
        None => SchemaDescription::builtin().context("Built-in schema description is invalid"),
    }
}
