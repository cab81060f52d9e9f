//! Application layer of the Tradeboard session engine.
//!
//! Orchestrates the per-domain registries and history logs of
//! `tradeboard-core` behind one command surface, derives the cross-domain
//! read models and binds the engine to its persistence port.

pub mod aggregation;
pub mod dashboard_service;
pub mod engine;

pub use aggregation::RecentSession;
pub use dashboard_service::DashboardService;
pub use engine::{EngineCommand, EngineSignal, SessionEngine};
