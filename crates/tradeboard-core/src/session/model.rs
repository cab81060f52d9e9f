//! Session record domain model.
//!
//! A `SessionRecord` is one in-flight or recently finished analysis run of the
//! remote agent backend, tracked client-side from start to terminal status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::proposal::TradeProposal;
use crate::market::MarketDomain;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Running,
    AwaitingApproval,
    Completed,
    Cancelled,
    Error,
}

impl SessionStatus {
    /// Completed, cancelled and errored sessions never change status again
    /// through the engine's terminal transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Cancelled | SessionStatus::Error
        )
    }

    /// Statuses counted against the domain's concurrency ceiling.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Running | SessionStatus::AwaitingApproval)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Running => "running",
            SessionStatus::AwaitingApproval => "awaiting_approval",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one analyst's contribution to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    /// Analyst or agent that produced the analysis (e.g. "technical", "news")
    pub analyst: String,
    /// Human-readable summary
    pub summary: String,
    /// Directional signal such as "bullish" / "bearish"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    /// Confidence in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Free-form structured payload from the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl AnalysisSummary {
    pub fn new(analyst: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            analyst: analyst.into(),
            summary: summary.into(),
            signal: None,
            confidence: None,
            details: None,
            created_at: Utc::now(),
        }
    }
}

/// Snapshot of a held position at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSnapshot {
    pub ticker: String,
    pub quantity: f64,
    pub average_price: f64,
    pub current_price: f64,
    pub unrealized_pnl: f64,
    #[serde(default = "Utc::now")]
    pub as_of: DateTime<Utc>,
}

/// One analysis session tracked by a domain registry.
///
/// Fields are public for reading. Mutation goes through
/// [`DomainRegistry`](super::DomainRegistry), which is the single owner of
/// every record it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Opaque unique identifier, immutable after creation
    pub session_id: String,
    /// Instrument identifier (ticker, market pair or stock code)
    pub ticker: String,
    /// Human label shown in the dashboard
    pub display_name: String,
    pub market_domain: MarketDomain,
    pub status: SessionStatus,
    /// Free-form label of the current analysis phase
    pub current_stage: Option<String>,
    /// Chronological, append-only reasoning trace
    pub reasoning_log: Vec<String>,
    /// Append-only analysis summaries
    pub analyses: Vec<AnalysisSummary>,
    pub trade_proposal: Option<TradeProposal>,
    /// Set by the backend independently of `trade_proposal`
    pub awaiting_approval: bool,
    pub active_position: Option<PositionSnapshot>,
    /// Non-null only while `status == Error`
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Latch for the approval gate: set when the dialog signal fired for the
    /// current (awaiting, proposal) pair, cleared when the pair breaks.
    #[serde(skip)]
    approval_prompted: bool,
}

impl SessionRecord {
    pub(crate) fn new(
        session_id: String,
        ticker: String,
        display_name: Option<String>,
        market_domain: MarketDomain,
    ) -> Self {
        let now = Utc::now();
        Self {
            display_name: display_name.unwrap_or_else(|| ticker.clone()),
            session_id,
            ticker,
            market_domain,
            status: SessionStatus::Running,
            current_stage: None,
            reasoning_log: Vec::new(),
            analyses: Vec::new(),
            trade_proposal: None,
            awaiting_approval: false,
            active_position: None,
            error: None,
            created_at: now,
            updated_at: now,
            approval_prompted: false,
        }
    }

    /// Refreshes `updated_at`. Called after every mutation.
    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// True when both halves of the approval pair are present.
    pub fn approval_ready(&self) -> bool {
        self.awaiting_approval && self.trade_proposal.is_some()
    }

    /// Evaluates the approval gate after a mutation.
    ///
    /// Returns `true` only on the mutation that completes the pair. The latch
    /// rearms once either half is withdrawn. Terminal records never fire.
    pub(crate) fn evaluate_approval_gate(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        if self.approval_ready() {
            if self.approval_prompted {
                return false;
            }
            self.approval_prompted = true;
            true
        } else {
            self.approval_prompted = false;
            false
        }
    }

    /// Sets a status while keeping `error` consistent with it.
    pub(crate) fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
        if status != SessionStatus::Error {
            self.error = None;
        }
    }
}
