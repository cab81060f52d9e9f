pub mod history;
pub mod output;
pub mod prefs;
pub mod replay;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tradeboard_application::DashboardService;
use tradeboard_core::DashboardRepository;
use tradeboard_infrastructure::{EngineConfigLoader, FileDashboardRepository};

/// Loads the engine config and restores the dashboard from disk.
pub async fn open_service(
    data_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
) -> Result<DashboardService> {
    let loader = match config_file {
        Some(path) => EngineConfigLoader::with_path(path),
        None => EngineConfigLoader::new().context("Failed to resolve config path")?,
    };
    let config = loader
        .load()
        .with_context(|| format!("Failed to load {}", loader.path().display()))?;

    let repository = match data_file {
        Some(path) => FileDashboardRepository::with_path(path),
        None => FileDashboardRepository::new().context("Failed to resolve data path")?,
    };
    tracing::debug!(path = %repository.path().display(), "Using dashboard file");

    let repository: Arc<dyn DashboardRepository> = Arc::new(repository);
    Ok(DashboardService::restore(config, repository).await)
}
