//! Domain layer of the Tradeboard session engine.
//!
//! Contains the per-domain session registries, the durable history log, the
//! persistence port and the shared error type. The orchestration of these
//! pieces lives in `tradeboard-application`.

pub mod config;
pub mod error;
pub mod history;
pub mod market;
pub mod preferences;
pub mod repository;
pub mod session;

// Re-export common types
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use market::{MarketDomain, PerDomain};
pub use preferences::{Language, Preferences};
pub use repository::{DashboardRepository, PersistedDashboard};
