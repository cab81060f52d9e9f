//! The session engine.
//!
//! `SessionEngine` owns one [`DomainRegistry`] and one [`HistoryLog`] per
//! market domain and is the only entry point for mutating them. Each command
//! runs to completion synchronously: the registry is updated first, then the
//! history log, then signals are published.

use tokio::sync::mpsc;
use tradeboard_core::config::EngineConfig;
use tradeboard_core::history::{HistoryEntry, HistoryLog};
use tradeboard_core::session::{
    AnalysisSummary, DomainRegistry, LegacyProjection, PositionSnapshot, SessionPatch,
    SessionRecord, SessionStatus, TradeProposal, UpdateOutcome,
};
use tradeboard_core::{MarketDomain, PerDomain, PersistedDashboard, Preferences, Result};

use super::command::EngineCommand;
use super::signal::EngineSignal;
use crate::aggregation::{self, RecentSession};

/// Client-side state engine for multi-market analysis sessions.
pub struct SessionEngine {
    config: EngineConfig,
    registries: PerDomain<DomainRegistry>,
    histories: PerDomain<HistoryLog>,
    preferences: Preferences,
    signal_tx: Option<mpsc::UnboundedSender<EngineSignal>>,
}

impl SessionEngine {
    pub fn new(config: EngineConfig) -> Self {
        let registries =
            PerDomain::from_fn(|domain| DomainRegistry::new(domain, config.max_concurrent_for(domain)));
        let histories = PerDomain::from_fn(|domain| HistoryLog::new(domain, config.history_limit));
        Self {
            config,
            registries,
            histories,
            preferences: Preferences::default(),
            signal_tx: None,
        }
    }

    /// Subscribes to engine signals.
    ///
    /// There is one subscriber at a time; a new subscription replaces the
    /// previous one.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<EngineSignal> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.signal_tx = Some(tx);
        rx
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ============================================================================
    // Persistence bridge
    // ============================================================================

    /// Replaces history logs and preferences with stored state.
    ///
    /// Live sessions are left untouched; after a restart there are none.
    pub fn restore(&mut self, stored: PersistedDashboard) {
        let limit = self.config.history_limit;
        let PersistedDashboard {
            preferences,
            mut history,
        } = stored;
        self.histories = PerDomain::from_fn(|domain| {
            HistoryLog::from_entries(domain, history.remove(&domain).unwrap_or_default(), limit)
        });
        self.preferences = preferences;

        tracing::info!(
            entries = self.histories.values().map(HistoryLog::len).sum::<usize>(),
            "Restored dashboard history"
        );
    }

    /// The durable part of the engine state.
    pub fn snapshot(&self) -> PersistedDashboard {
        PersistedDashboard {
            preferences: self.preferences.clone(),
            history: self
                .histories
                .iter()
                .map(|(domain, log)| (domain, log.to_vec()))
                .collect(),
        }
    }

    // ============================================================================
    // Reads
    // ============================================================================

    pub fn registry(&self, domain: MarketDomain) -> &DomainRegistry {
        self.registries.get(domain)
    }

    pub fn sessions(&self, domain: MarketDomain) -> &[SessionRecord] {
        self.registries.get(domain).sessions()
    }

    pub fn session(&self, domain: MarketDomain, session_id: &str) -> Option<&SessionRecord> {
        self.registries.get(domain).get(session_id)
    }

    pub fn active_session_id(&self, domain: MarketDomain) -> Option<&str> {
        self.registries.get(domain).active_session_id()
    }

    pub fn legacy_projection(&self, domain: MarketDomain) -> LegacyProjection {
        self.registries.get(domain).legacy_projection()
    }

    pub fn history(&self, domain: MarketDomain) -> &HistoryLog {
        self.histories.get(domain)
    }

    /// Running and awaiting sessions of every domain, oldest first.
    pub fn active_sessions(&self) -> Vec<&SessionRecord> {
        aggregation::active_sessions(self.registries.values())
    }

    /// The `limit` most recently updated finished or awaiting sessions.
    pub fn recent_sessions(&self, limit: usize) -> Vec<RecentSession> {
        aggregation::recent_sessions(self.registries.values(), self.histories.values(), limit)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn set_preferences(&mut self, preferences: Preferences) {
        self.preferences = preferences;
    }

    // ============================================================================
    // Session commands
    // ============================================================================

    /// Admits a new running session and appends its history summary.
    ///
    /// # Errors
    ///
    /// `DuplicateSession` or `CapacityReached`; nothing changes on error.
    pub fn create_session(
        &mut self,
        domain: MarketDomain,
        session_id: impl Into<String>,
        ticker: impl Into<String>,
        display_name: Option<String>,
    ) -> Result<()> {
        let record = self
            .registries
            .get_mut(domain)
            .create_session(session_id, ticker, display_name)?;
        let session_id = record.session_id.clone();
        self.histories.get_mut(domain).append(HistoryEntry::started(record));

        self.emit(EngineSignal::SessionStarted { domain, session_id });
        Ok(())
    }

    /// Removes a session from the live registry. History is kept.
    pub fn remove_session(&mut self, domain: MarketDomain, session_id: &str) -> bool {
        if self.registries.get_mut(domain).remove_session(session_id).is_none() {
            tracing::debug!(%domain, session_id, "Ignoring removal of unknown session");
            return false;
        }
        self.emit(EngineSignal::SessionRemoved {
            domain,
            session_id: session_id.to_string(),
        });
        true
    }

    /// Removes every live session of the domain. History is kept.
    pub fn clear_sessions(&mut self, domain: MarketDomain) -> usize {
        let removed = self.registries.get_mut(domain).clear();
        for record in &removed {
            self.emit(EngineSignal::SessionRemoved {
                domain,
                session_id: record.session_id.clone(),
            });
        }
        tracing::info!(%domain, removed = removed.len(), "Cleared live sessions");
        removed.len()
    }

    pub fn set_active_session(&mut self, domain: MarketDomain, session_id: &str) -> bool {
        self.registries.get_mut(domain).set_active_session(session_id)
    }

    pub fn append_reasoning(
        &mut self,
        domain: MarketDomain,
        session_id: &str,
        entry: impl Into<String>,
    ) -> bool {
        let outcome = self.registries.get_mut(domain).append_reasoning(session_id, entry);
        self.after_update(domain, session_id, outcome)
    }

    pub fn set_stage(&mut self, domain: MarketDomain, session_id: &str, stage: Option<String>) -> bool {
        let patch = match stage {
            Some(stage) => SessionPatch::new().stage(stage),
            None => SessionPatch::new().clear_stage(),
        };
        // Stage changes never touch status, so the ceiling cannot reject them.
        let outcome = self
            .registries
            .get_mut(domain)
            .apply(session_id, patch)
            .ok()
            .flatten();
        self.after_update(domain, session_id, outcome)
    }

    /// Appends analysis summaries; existing ones are never replaced.
    pub fn record_analyses(
        &mut self,
        domain: MarketDomain,
        session_id: &str,
        analyses: Vec<AnalysisSummary>,
    ) -> bool {
        let outcome = self.registries.get_mut(domain).append_analyses(session_id, analyses);
        self.after_update(domain, session_id, outcome)
    }

    /// Sets or clears the trade proposal.
    ///
    /// Returns `Ok(false)` for an unknown session.
    ///
    /// # Errors
    ///
    /// `DomainMismatch` if the proposal belongs to another domain.
    pub fn set_trade_proposal(
        &mut self,
        domain: MarketDomain,
        session_id: &str,
        proposal: Option<TradeProposal>,
    ) -> Result<bool> {
        let outcome = self
            .registries
            .get_mut(domain)
            .set_trade_proposal(session_id, proposal)?;
        Ok(self.after_update(domain, session_id, outcome))
    }

    pub fn set_awaiting_approval(&mut self, domain: MarketDomain, session_id: &str, awaiting: bool) -> bool {
        let outcome = self
            .registries
            .get_mut(domain)
            .set_awaiting_approval(session_id, awaiting);
        self.after_update(domain, session_id, outcome)
    }

    pub fn set_position(
        &mut self,
        domain: MarketDomain,
        session_id: &str,
        position: Option<PositionSnapshot>,
    ) -> bool {
        let outcome = self
            .registries
            .get_mut(domain)
            .apply(session_id, SessionPatch::new().position(position))
            .ok()
            .flatten();
        self.after_update(domain, session_id, outcome)
    }

    /// Applies an arbitrary partial update.
    ///
    /// A patch that makes the session terminal finalizes its history entry
    /// like the dedicated commands do.
    ///
    /// # Errors
    ///
    /// `CapacityReached` if the patch would revive a finished session while
    /// the domain is at its ceiling.
    pub fn apply(&mut self, domain: MarketDomain, session_id: &str, patch: SessionPatch) -> Result<bool> {
        let was_terminal = self
            .session(domain, session_id)
            .is_some_and(|record| record.status.is_terminal());
        let outcome = self.registries.get_mut(domain).apply(session_id, patch)?;
        let applied = self.after_update(domain, session_id, outcome);
        if applied && !was_terminal {
            self.finalize_if_terminal(domain, session_id, None);
        }
        Ok(applied)
    }

    /// Moves the session to `error` and finalizes its history entry.
    pub fn set_error(&mut self, domain: MarketDomain, session_id: &str, message: impl Into<String>) -> bool {
        self.finish(domain, session_id, SessionStatus::Error, Some(message.into()), None)
    }

    /// Moves the session to `cancelled` and finalizes its history entry.
    pub fn cancel_session(&mut self, domain: MarketDomain, session_id: &str) -> bool {
        self.finish(domain, session_id, SessionStatus::Cancelled, None, None)
    }

    /// Completes a session.
    ///
    /// `analyses` are appended before the status changes. Without an explicit
    /// `reasoning_summary` one is derived from the tail of the reasoning log.
    /// The record stays in the registry until it is removed.
    pub fn complete_session(
        &mut self,
        domain: MarketDomain,
        session_id: &str,
        analyses: Vec<AnalysisSummary>,
        reasoning_summary: Option<String>,
    ) -> bool {
        let finishable = self
            .session(domain, session_id)
            .is_some_and(|record| !record.status.is_terminal());
        if finishable && !analyses.is_empty() {
            self.registries.get_mut(domain).append_analyses(session_id, analyses);
        }
        self.finish(
            domain,
            session_id,
            SessionStatus::Completed,
            None,
            reasoning_summary,
        )
    }

    // ============================================================================
    // History commands
    // ============================================================================

    /// Drops every history entry of the domain. Live sessions are kept.
    pub fn clear_history(&mut self, domain: MarketDomain) -> usize {
        let removed = self.histories.get_mut(domain).clear();
        tracing::info!(%domain, removed, "Cleared history");
        removed
    }

    /// Removes one history entry without touching the live registry.
    pub fn dismiss_history_entry(&mut self, domain: MarketDomain, session_id: &str) -> bool {
        let dismissed = self.histories.get_mut(domain).dismiss(session_id).is_some();
        if !dismissed {
            tracing::debug!(%domain, session_id, "No history entry to dismiss");
        }
        dismissed
    }

    // ============================================================================
    // Dispatch
    // ============================================================================

    /// Applies a serialized command.
    ///
    /// Returns whether the command changed anything. Orphan events yield
    /// `Ok(false)`; rejections are returned as errors.
    pub fn dispatch(&mut self, command: EngineCommand) -> Result<bool> {
        tracing::debug!(kind = command.kind(), domain = %command.domain(), "Dispatching command");

        match command {
            EngineCommand::CreateSession {
                domain,
                session_id,
                ticker,
                display_name,
            } => self
                .create_session(domain, session_id, ticker, display_name)
                .map(|_| true),
            EngineCommand::RemoveSession { domain, session_id } => {
                Ok(self.remove_session(domain, &session_id))
            }
            EngineCommand::ClearSessions { domain } => Ok(self.clear_sessions(domain) > 0),
            EngineCommand::SetActiveSession { domain, session_id } => {
                Ok(self.set_active_session(domain, &session_id))
            }
            EngineCommand::AppendReasoning {
                domain,
                session_id,
                entry,
            } => Ok(self.append_reasoning(domain, &session_id, entry)),
            EngineCommand::SetStage {
                domain,
                session_id,
                stage,
            } => Ok(self.set_stage(domain, &session_id, stage)),
            EngineCommand::RecordAnalyses {
                domain,
                session_id,
                analyses,
            } => Ok(self.record_analyses(domain, &session_id, analyses)),
            EngineCommand::SetProposal {
                domain,
                session_id,
                proposal,
            } => self.set_trade_proposal(domain, &session_id, proposal),
            EngineCommand::SetAwaitingApproval {
                domain,
                session_id,
                awaiting,
            } => Ok(self.set_awaiting_approval(domain, &session_id, awaiting)),
            EngineCommand::SetPosition {
                domain,
                session_id,
                position,
            } => Ok(self.set_position(domain, &session_id, position)),
            EngineCommand::SetError {
                domain,
                session_id,
                message,
            } => Ok(self.set_error(domain, &session_id, message)),
            EngineCommand::CancelSession { domain, session_id } => {
                Ok(self.cancel_session(domain, &session_id))
            }
            EngineCommand::CompleteSession {
                domain,
                session_id,
                analyses,
                reasoning_summary,
            } => Ok(self.complete_session(domain, &session_id, analyses, reasoning_summary)),
            EngineCommand::ApplyPatch {
                domain,
                session_id,
                patch,
            } => self.apply(domain, &session_id, patch),
            EngineCommand::ClearHistory { domain } => Ok(self.clear_history(domain) > 0),
            EngineCommand::DismissHistoryEntry { domain, session_id } => {
                Ok(self.dismiss_history_entry(domain, &session_id))
            }
        }
    }

    // ============================================================================
    // Internals
    // ============================================================================

    /// Publishes the approval signal if the mutation completed the pair.
    fn after_update(&mut self, domain: MarketDomain, session_id: &str, outcome: Option<UpdateOutcome>) -> bool {
        let Some(outcome) = outcome else {
            return false;
        };
        if outcome.approval_requested {
            let proposal = self
                .session(domain, session_id)
                .and_then(|record| record.trade_proposal.clone());
            if let Some(proposal) = proposal {
                tracing::info!(%domain, session_id, "Approval requested");
                self.emit(EngineSignal::ApprovalRequested {
                    domain,
                    session_id: session_id.to_string(),
                    proposal,
                });
            }
        }
        true
    }

    fn finish(
        &mut self,
        domain: MarketDomain,
        session_id: &str,
        status: SessionStatus,
        error: Option<String>,
        reasoning_summary: Option<String>,
    ) -> bool {
        if self
            .registries
            .get_mut(domain)
            .finish_session(session_id, status, error)
            .is_none()
        {
            return false;
        }
        self.finalize_if_terminal(domain, session_id, reasoning_summary);
        true
    }

    /// Writes the full history snapshot once the session is terminal.
    fn finalize_if_terminal(&mut self, domain: MarketDomain, session_id: &str, reasoning_summary: Option<String>) {
        let Some(record) = self.registries.get(domain).get(session_id) else {
            return;
        };
        if !record.status.is_terminal() {
            return;
        }
        let status = record.status;
        let entry = HistoryEntry::finished(record, reasoning_summary, self.config.reasoning_summary_lines);
        self.histories.get_mut(domain).record_terminal(entry);

        tracing::info!(%domain, session_id, %status, "Session finished");
        self.emit(EngineSignal::SessionFinished {
            domain,
            session_id: session_id.to_string(),
            status,
        });
    }

    fn emit(&self, signal: EngineSignal) {
        if let Some(tx) = &self.signal_tx {
            if tx.send(signal).is_err() {
                tracing::debug!("Signal subscriber dropped");
            }
        }
    }
}

impl Default for SessionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
