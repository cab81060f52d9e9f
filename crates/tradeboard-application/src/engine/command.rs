//! Serializable engine commands.
//!
//! Every inbound command of the engine has a variant here so that a stream of
//! backend events can be recorded and replayed, one JSON object per line:
//!
//! ```json
//! {"type":"create_session","domain":"crypto","session_id":"s-1","ticker":"KRW-BTC"}
//! {"type":"append_reasoning","domain":"crypto","session_id":"s-1","entry":"RSI oversold"}
//! ```

use serde::{Deserialize, Serialize};
use tradeboard_core::MarketDomain;
use tradeboard_core::session::{
    AnalysisSummary, PositionSnapshot, SessionPatch, TradeProposal, new_session_id,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineCommand {
    CreateSession {
        domain: MarketDomain,
        /// Generated when the script does not name one
        #[serde(default = "new_session_id")]
        session_id: String,
        ticker: String,
        #[serde(default)]
        display_name: Option<String>,
    },
    RemoveSession {
        domain: MarketDomain,
        session_id: String,
    },
    ClearSessions {
        domain: MarketDomain,
    },
    SetActiveSession {
        domain: MarketDomain,
        session_id: String,
    },
    AppendReasoning {
        domain: MarketDomain,
        session_id: String,
        entry: String,
    },
    SetStage {
        domain: MarketDomain,
        session_id: String,
        #[serde(default)]
        stage: Option<String>,
    },
    RecordAnalyses {
        domain: MarketDomain,
        session_id: String,
        analyses: Vec<AnalysisSummary>,
    },
    SetProposal {
        domain: MarketDomain,
        session_id: String,
        #[serde(default)]
        proposal: Option<TradeProposal>,
    },
    SetAwaitingApproval {
        domain: MarketDomain,
        session_id: String,
        awaiting: bool,
    },
    SetPosition {
        domain: MarketDomain,
        session_id: String,
        #[serde(default)]
        position: Option<PositionSnapshot>,
    },
    SetError {
        domain: MarketDomain,
        session_id: String,
        message: String,
    },
    CancelSession {
        domain: MarketDomain,
        session_id: String,
    },
    CompleteSession {
        domain: MarketDomain,
        session_id: String,
        #[serde(default)]
        analyses: Vec<AnalysisSummary>,
        #[serde(default)]
        reasoning_summary: Option<String>,
    },
    ApplyPatch {
        domain: MarketDomain,
        session_id: String,
        patch: SessionPatch,
    },
    ClearHistory {
        domain: MarketDomain,
    },
    DismissHistoryEntry {
        domain: MarketDomain,
        session_id: String,
    },
}

impl EngineCommand {
    pub fn domain(&self) -> MarketDomain {
        match self {
            EngineCommand::CreateSession { domain, .. }
            | EngineCommand::RemoveSession { domain, .. }
            | EngineCommand::ClearSessions { domain }
            | EngineCommand::SetActiveSession { domain, .. }
            | EngineCommand::AppendReasoning { domain, .. }
            | EngineCommand::SetStage { domain, .. }
            | EngineCommand::RecordAnalyses { domain, .. }
            | EngineCommand::SetProposal { domain, .. }
            | EngineCommand::SetAwaitingApproval { domain, .. }
            | EngineCommand::SetPosition { domain, .. }
            | EngineCommand::SetError { domain, .. }
            | EngineCommand::CancelSession { domain, .. }
            | EngineCommand::CompleteSession { domain, .. }
            | EngineCommand::ApplyPatch { domain, .. }
            | EngineCommand::ClearHistory { domain }
            | EngineCommand::DismissHistoryEntry { domain, .. } => *domain,
        }
    }

    /// Short name used in logs, matching the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineCommand::CreateSession { .. } => "create_session",
            EngineCommand::RemoveSession { .. } => "remove_session",
            EngineCommand::ClearSessions { .. } => "clear_sessions",
            EngineCommand::SetActiveSession { .. } => "set_active_session",
            EngineCommand::AppendReasoning { .. } => "append_reasoning",
            EngineCommand::SetStage { .. } => "set_stage",
            EngineCommand::RecordAnalyses { .. } => "record_analyses",
            EngineCommand::SetProposal { .. } => "set_proposal",
            EngineCommand::SetAwaitingApproval { .. } => "set_awaiting_approval",
            EngineCommand::SetPosition { .. } => "set_position",
            EngineCommand::SetError { .. } => "set_error",
            EngineCommand::CancelSession { .. } => "cancel_session",
            EngineCommand::CompleteSession { .. } => "complete_session",
            EngineCommand::ApplyPatch { .. } => "apply_patch",
            EngineCommand::ClearHistory { .. } => "clear_history",
            EngineCommand::DismissHistoryEntry { .. } => "dismiss_history_entry",
        }
    }
}
