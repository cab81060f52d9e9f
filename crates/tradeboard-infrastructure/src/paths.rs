//! Path management for Tradeboard files.
//!
//! Paths are resolved via `AppPaths` from version-migrate so they follow the
//! platform conventions (XDG on Linux).
//!
//! ```text
//! ~/.config/tradeboard/        # Config directory
//! └── config.toml              # Engine configuration
//!
//! ~/.local/share/tradeboard/   # Data directory
//! └── dashboard.json           # History logs and preferences
//! ```

use std::path::PathBuf;

use thiserror::Error;
use tradeboard_core::EngineError;
use version_migrate::AppPaths;

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("Cannot find home directory")]
    HomeDirNotFound,
}

impl From<PathError> for EngineError {
    fn from(err: PathError) -> Self {
        EngineError::config(err.to_string())
    }
}

pub struct TradeboardPaths;

impl TradeboardPaths {
    const APP_NAME: &'static str = "tradeboard";
    const CONFIG_FILENAME: &'static str = "config.toml";
    const DASHBOARD_FILENAME: &'static str = "dashboard.json";

    fn app_paths() -> AppPaths {
        AppPaths::new(Self::APP_NAME)
    }

    pub fn config_dir() -> Result<PathBuf, PathError> {
        Self::app_paths()
            .config_dir()
            .map_err(|_| PathError::HomeDirNotFound)
    }

    pub fn data_dir() -> Result<PathBuf, PathError> {
        Self::app_paths()
            .data_dir()
            .map_err(|_| PathError::HomeDirNotFound)
    }

    /// `config.toml` in the config directory.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join(Self::CONFIG_FILENAME))
    }

    /// `dashboard.json` in the data directory.
    pub fn dashboard_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join(Self::DASHBOARD_FILENAME))
    }
}
