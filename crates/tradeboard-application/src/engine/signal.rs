//! Signals raised by the engine for the presentation layer.

use serde::{Deserialize, Serialize};
use tradeboard_core::MarketDomain;
use tradeboard_core::session::{SessionStatus, TradeProposal};

/// A lifecycle notification derived from an applied command.
///
/// Signals are published after the command's mutation is complete, so a
/// subscriber reading the engine in response always sees the new state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineSignal {
    /// A session was admitted and became the domain's active session.
    SessionStarted {
        domain: MarketDomain,
        session_id: String,
    },
    /// The session now awaits approval and holds a proposal; open the dialog.
    ApprovalRequested {
        domain: MarketDomain,
        session_id: String,
        proposal: TradeProposal,
    },
    /// The session reached a terminal status and its history entry was finalized.
    SessionFinished {
        domain: MarketDomain,
        session_id: String,
        status: SessionStatus,
    },
    /// The operator removed the session from the live registry.
    SessionRemoved {
        domain: MarketDomain,
        session_id: String,
    },
}

impl EngineSignal {
    pub fn domain(&self) -> MarketDomain {
        match self {
            EngineSignal::SessionStarted { domain, .. }
            | EngineSignal::ApprovalRequested { domain, .. }
            | EngineSignal::SessionFinished { domain, .. }
            | EngineSignal::SessionRemoved { domain, .. } => *domain,
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            EngineSignal::SessionStarted { session_id, .. }
            | EngineSignal::ApprovalRequested { session_id, .. }
            | EngineSignal::SessionFinished { session_id, .. }
            | EngineSignal::SessionRemoved { session_id, .. } => session_id,
        }
    }
}
