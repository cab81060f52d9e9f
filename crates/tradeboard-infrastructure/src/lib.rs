//! Infrastructure layer of the Tradeboard session engine.
//!
//! File-backed implementations of the persistence port, versioned DTOs for
//! the on-disk schema and the engine configuration loader.

pub mod config_loader;
pub mod dto;
pub mod file_dashboard_repository;
pub mod paths;
pub mod storage;

pub use crate::config_loader::EngineConfigLoader;
pub use crate::file_dashboard_repository::FileDashboardRepository;
pub use crate::paths::TradeboardPaths;
