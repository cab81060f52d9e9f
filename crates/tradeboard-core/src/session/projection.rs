//! Legacy single-session projection.
//!
//! Older call sites assume exactly one session per domain. They read a flat
//! mirror of the active record instead of the registry. The projection is
//! derived: the registry recomputes it after every mutation and nothing else
//! can write it.

use serde::{Deserialize, Serialize};

use super::model::{AnalysisSummary, PositionSnapshot, SessionRecord, SessionStatus};
use super::proposal::TradeProposal;

/// Status as seen by legacy consumers; `Idle` means "no active session".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyStatus {
    #[default]
    Idle,
    Pending,
    Running,
    AwaitingApproval,
    Completed,
    Cancelled,
    Error,
}

impl From<SessionStatus> for LegacyStatus {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Pending => LegacyStatus::Pending,
            SessionStatus::Running => LegacyStatus::Running,
            SessionStatus::AwaitingApproval => LegacyStatus::AwaitingApproval,
            SessionStatus::Completed => LegacyStatus::Completed,
            SessionStatus::Cancelled => LegacyStatus::Cancelled,
            SessionStatus::Error => LegacyStatus::Error,
        }
    }
}

/// Flat view of a domain's active session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProjection {
    pub session_id: Option<String>,
    pub ticker: Option<String>,
    pub display_name: Option<String>,
    pub status: LegacyStatus,
    pub current_stage: Option<String>,
    pub reasoning_log: Vec<String>,
    pub analyses: Vec<AnalysisSummary>,
    pub trade_proposal: Option<TradeProposal>,
    pub awaiting_approval: bool,
    pub active_position: Option<PositionSnapshot>,
    pub error: Option<String>,
}

impl LegacyProjection {
    /// Projects a record, or returns the idle defaults when there is none.
    pub fn project(active: Option<&SessionRecord>) -> Self {
        match active {
            Some(record) => Self {
                session_id: Some(record.session_id.clone()),
                ticker: Some(record.ticker.clone()),
                display_name: Some(record.display_name.clone()),
                status: record.status.into(),
                current_stage: record.current_stage.clone(),
                reasoning_log: record.reasoning_log.clone(),
                analyses: record.analyses.clone(),
                trade_proposal: record.trade_proposal.clone(),
                awaiting_approval: record.awaiting_approval,
                active_position: record.active_position.clone(),
                error: record.error.clone(),
            },
            None => Self::default(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == LegacyStatus::Idle
    }
}
