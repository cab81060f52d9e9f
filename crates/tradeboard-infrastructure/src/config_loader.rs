//! Engine configuration loader.
//!
//! Reads `config.toml` through a versioned migrator. A missing file yields
//! the built-in defaults; a malformed one is reported so the operator can fix
//! it instead of silently running with different ceilings.

use std::path::{Path, PathBuf};

use version_migrate::Migrator;

use tradeboard_core::error::Result;
use tradeboard_core::{EngineConfig, EngineError};

use crate::dto::{create_engine_config_migrator, ensure_toml_version};
use crate::paths::TradeboardPaths;

pub struct EngineConfigLoader {
    path: PathBuf,
    migrator: Migrator,
}

impl EngineConfigLoader {
    /// Loader for the default `config.toml`.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(TradeboardPaths::config_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            migrator: create_engine_config_migrator(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<EngineConfig> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(EngineConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let mut toml_value: toml::Value = toml::from_str(&content).map_err(|e| {
            EngineError::config(format!(
                "Failed to parse '{}': {}",
                self.path.display(),
                e
            ))
        })?;
        ensure_toml_version(&mut toml_value);

        let config: EngineConfig = self
            .migrator
            .load_flat_from("engine_config", toml_value)
            .map_err(|e| {
                EngineError::config(format!(
                    "Failed to read engine config '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;

        tracing::debug!(path = %self.path.display(), ?config, "Loaded engine config");
        Ok(config)
    }
}
