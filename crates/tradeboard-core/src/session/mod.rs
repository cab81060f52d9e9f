//! Session domain module.
//!
//! This module contains the live, in-memory side of the engine: session
//! records, trade proposals, partial updates, the per-domain registry and the
//! legacy single-session projection.
//!
//! # Module Structure
//!
//! - `model`: `SessionRecord`, `SessionStatus`, analysis and position snapshots
//! - `proposal`: per-domain `TradeProposal` variants
//! - `patch`: `SessionPatch` partial updates
//! - `projection`: `LegacyProjection` derived from the active record
//! - `registry`: `DomainRegistry`, the single owner of a domain's records
//!
//! Nothing in here is persisted. Records are reset on reload; durable state
//! lives in [`crate::history`].

mod model;
mod patch;
mod projection;
mod proposal;
mod registry;

// Re-export public API
pub use model::{AnalysisSummary, PositionSnapshot, SessionRecord, SessionStatus};
pub use patch::SessionPatch;
pub use projection::{LegacyProjection, LegacyStatus};
pub use proposal::{
    CryptoProposal, DomesticEquityProposal, EquityProposal, TradeAction, TradeProposal,
};
pub use registry::{DEFAULT_MAX_CONCURRENT_SESSIONS, DomainRegistry, UpdateOutcome};

/// Generates a fresh opaque session id.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
